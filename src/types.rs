//! Transport-neutral views of the Telegram objects the facade works with.
//!
//! The facade and its handlers only see these types; [`crate::transport::TelegramTransport`]
//! converts teloxide's types into them.

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chat {
  pub id: i64,
  pub username: Option<String>,
  pub title: Option<String>,
  pub first_name: Option<String>,
}

impl Chat {
  /// Human-readable chat identity: username, then title, then first name, then the numeric id.
  pub fn display_name(&self) -> String {
    [&self.username, &self.title, &self.first_name]
      .into_iter()
      .flatten()
      .find(|name| !name.is_empty())
      .cloned()
      .unwrap_or_else(|| self.id.to_string())
  }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
  pub id: i32,
  pub chat: Chat,
  pub from_id: Option<u64>,
  pub text: Option<String>,
  pub date: DateTime<Utc>,
  pub thread_id: Option<i32>,
  pub is_topic_message: bool,
}

impl Message {
  pub fn text(&self) -> Option<&str> {
    self.text.as_deref()
  }

  /// Thread a reply to this message should be addressed to.
  pub fn reply_thread(&self) -> Option<i32> {
    if self.is_topic_message { self.thread_id } else { None }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CallbackQuery {
  pub id: String,
  pub from_id: u64,
  pub data: Option<String>,
  pub message: Option<Message>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Update {
  pub id: u32,
  pub kind: UpdateKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateKind {
  Message(Message),
  CallbackQuery(CallbackQuery),
  /// Anything the facade does not bind handlers for.
  Other,
}

impl From<&teloxide::types::Chat> for Chat {
  fn from(chat: &teloxide::types::Chat) -> Self {
    Self {
      id: chat.id.0,
      username: chat.username().map(str::to_owned),
      title: chat.title().map(str::to_owned),
      first_name: chat.first_name().map(str::to_owned),
    }
  }
}

impl From<&teloxide::types::Message> for Message {
  fn from(msg: &teloxide::types::Message) -> Self {
    Self {
      id: msg.id.0,
      chat: Chat::from(&msg.chat),
      from_id: msg.from.as_ref().map(|user| user.id.0),
      text: msg.text().map(str::to_owned),
      date: msg.date,
      thread_id: msg.thread_id.map(|thread| thread.0.0),
      is_topic_message: msg.is_topic_message,
    }
  }
}

impl From<&teloxide::types::CallbackQuery> for CallbackQuery {
  fn from(query: &teloxide::types::CallbackQuery) -> Self {
    Self {
      id: query.id.0.clone(),
      from_id: query.from.id.0,
      data: query.data.clone(),
      message: query.regular_message().map(Message::from),
    }
  }
}

impl From<teloxide::types::Update> for Update {
  fn from(update: teloxide::types::Update) -> Self {
    use teloxide::types::UpdateKind as Kind;

    let kind = match &update.kind {
      Kind::Message(msg) => UpdateKind::Message(Message::from(msg)),
      Kind::CallbackQuery(query) => UpdateKind::CallbackQuery(CallbackQuery::from(query)),
      _ => UpdateKind::Other,
    };
    Self { id: update.id.0, kind }
  }
}
