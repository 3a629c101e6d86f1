//! Recording [`Transport`] and fixtures shared by the unit tests.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicI32;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use chrono::Utc;
use teloxide::ApiError;
use teloxide::RequestError;
use teloxide::types::InlineKeyboardMarkup;
use teloxide::types::ParseMode;
use teloxide::types::ReplyMarkup;

use crate::bot::BotFacade;
use crate::transport::EditTextRequest;
use crate::transport::PollRequest;
use crate::transport::SendRequest;
use crate::transport::Transport;
use crate::types::CallbackQuery;
use crate::types::Chat;
use crate::types::Message;
use crate::types::Update;
use crate::types::UpdateKind;

/// One recorded transport call. Markup is reduced to its row count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
  Send {
    chat_id: i64,
    text: String,
    parse_mode: Option<ParseMode>,
    disable_link_preview: bool,
    thread_id: Option<i32>,
    markup_rows: Option<usize>,
  },
  EditText {
    chat_id: i64,
    message_id: i32,
    text: String,
    markup_rows: Option<usize>,
  },
  EditMarkup {
    chat_id: i64,
    message_id: i32,
    markup_rows: Option<usize>,
  },
  Delete {
    chat_id: i64,
    message_id: i32,
  },
  Answer {
    query_id: String,
    text: Option<String>,
  },
}

pub struct MockTransport {
  calls: Mutex<Vec<Call>>,
  polls: Mutex<Vec<PollRequest>>,
  batches: Mutex<VecDeque<Vec<Update>>>,
  failing: AtomicBool,
  confirm: AtomicBool,
  next_id: AtomicI32,
}

impl Default for MockTransport {
  fn default() -> Self {
    Self {
      calls: Mutex::new(Vec::new()),
      polls: Mutex::new(Vec::new()),
      batches: Mutex::new(VecDeque::new()),
      failing: AtomicBool::new(false),
      confirm: AtomicBool::new(true),
      next_id: AtomicI32::new(1000),
    }
  }
}

impl MockTransport {
  pub fn calls(&self) -> Vec<Call> {
    self.calls.lock().unwrap().clone()
  }

  pub fn polls(&self) -> Vec<PollRequest> {
    self.polls.lock().unwrap().clone()
  }

  /// Makes every message call fail with a Bot API error.
  pub fn fail_requests(&self, failing: bool) {
    self.failing.store(failing, Ordering::SeqCst);
  }

  pub fn confirm_answers(&self, confirm: bool) {
    self.confirm.store(confirm, Ordering::SeqCst);
  }

  /// Queues the result of one poll. Polling past the queue fails.
  pub fn queue_updates(&self, batch: Vec<Update>) {
    self.batches.lock().unwrap().push_back(batch);
  }

  fn record(&self, call: Call) -> Result<(), RequestError> {
    self.calls.lock().unwrap().push(call);
    if self.failing.load(Ordering::SeqCst) {
      return Err(RequestError::Api(ApiError::BotBlocked));
    }
    Ok(())
  }
}

fn inline_rows(markup: Option<&InlineKeyboardMarkup>) -> Option<usize> {
  markup.map(|markup| markup.inline_keyboard.len())
}

#[async_trait]
impl Transport for MockTransport {
  async fn send_message(&self, request: SendRequest) -> Result<Message, RequestError> {
    let markup_rows = match &request.reply_markup {
      Some(ReplyMarkup::InlineKeyboard(markup)) => inline_rows(Some(markup)),
      Some(_) => Some(0),
      None => None,
    };
    self.record(Call::Send {
      chat_id: request.chat_id,
      text: request.text.clone(),
      parse_mode: request.parse_mode,
      disable_link_preview: request.disable_link_preview,
      thread_id: request.thread_id,
      markup_rows,
    })?;

    let mut sent = message_in(
      Chat {
        id: request.chat_id,
        ..Chat::default()
      },
      &request.text,
    );
    sent.id = self.next_id.fetch_add(1, Ordering::SeqCst);
    sent.thread_id = request.thread_id;
    Ok(sent)
  }

  async fn edit_message_text(&self, request: EditTextRequest) -> Result<(), RequestError> {
    self.record(Call::EditText {
      chat_id: request.chat_id,
      message_id: request.message_id,
      text: request.text,
      markup_rows: inline_rows(request.reply_markup.as_ref()),
    })
  }

  async fn edit_message_reply_markup(
    &self,
    chat_id: i64,
    message_id: i32,
    markup: Option<InlineKeyboardMarkup>,
  ) -> Result<(), RequestError> {
    self.record(Call::EditMarkup {
      chat_id,
      message_id,
      markup_rows: inline_rows(markup.as_ref()),
    })
  }

  async fn delete_message(&self, chat_id: i64, message_id: i32) -> Result<(), RequestError> {
    self.record(Call::Delete { chat_id, message_id })
  }

  async fn answer_callback_query(&self, query_id: &str, text: Option<&str>) -> Result<bool, RequestError> {
    self.record(Call::Answer {
      query_id: query_id.to_string(),
      text: text.map(str::to_owned),
    })?;
    Ok(self.confirm.load(Ordering::SeqCst))
  }

  async fn get_updates(&self, request: PollRequest) -> Result<Vec<Update>, RequestError> {
    self.polls.lock().unwrap().push(request);
    self
      .batches
      .lock()
      .unwrap()
      .pop_front()
      .ok_or(RequestError::Api(ApiError::InvalidToken))
  }
}

pub fn private_chat() -> Chat {
  Chat {
    id: 7001,
    username: Some("alice".into()),
    title: None,
    first_name: Some("Alice".into()),
  }
}

pub fn group_chat(title: &str) -> Chat {
  Chat {
    id: -100_200,
    username: None,
    title: Some(title.to_string()),
    first_name: None,
  }
}

pub fn message_in(chat: Chat, text: &str) -> Message {
  Message {
    id: 1,
    chat,
    from_id: Some(7001),
    text: Some(text.to_string()),
    date: Utc::now(),
    thread_id: None,
    is_topic_message: false,
  }
}

pub fn callback_query(id: &str, data: &str) -> CallbackQuery {
  CallbackQuery {
    id: id.to_string(),
    from_id: 7001,
    data: Some(data.to_string()),
    message: Some(message_in(private_chat(), "menu")),
  }
}

pub fn update(id: u32, kind: UpdateKind) -> Update {
  Update { id, kind }
}

/// Replaces the facade's log sink with one that collects lines.
pub fn capture_log<T: Transport>(bot: &BotFacade<T>) -> Arc<Mutex<Vec<String>>> {
  let lines = Arc::new(Mutex::new(Vec::new()));
  let sink = Arc::clone(&lines);
  bot.bind_on_log(move |line| sink.lock().unwrap().push(line.to_string()));
  lines
}
