use async_trait::async_trait;
use teloxide::RequestError;
use teloxide::prelude::*;
use teloxide::types::CallbackQueryId;
use teloxide::types::ChatId;
use teloxide::types::InlineKeyboardMarkup;
use teloxide::types::LinkPreviewOptions;
use teloxide::types::MessageId;
use teloxide::types::ParseMode;
use teloxide::types::ReplyMarkup;
use teloxide::types::ThreadId;
use tracing::debug;
use tracing::instrument;

use crate::types::Message;
use crate::types::Update;

/// Outgoing text message, fully resolved by the facade.
#[derive(Debug, Clone)]
pub struct SendRequest {
  pub chat_id: i64,
  pub text: String,
  pub parse_mode: Option<ParseMode>,
  pub disable_link_preview: bool,
  pub thread_id: Option<i32>,
  pub reply_markup: Option<ReplyMarkup>,
}

#[derive(Debug, Clone)]
pub struct EditTextRequest {
  pub chat_id: i64,
  pub message_id: i32,
  pub text: String,
  pub parse_mode: Option<ParseMode>,
  pub disable_link_preview: bool,
  pub reply_markup: Option<InlineKeyboardMarkup>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollRequest {
  pub offset: i32,
  pub limit: u8,
  pub timeout_secs: u32,
}

/// The Bot API surface the facade consumes.
///
/// Errors are teloxide's [`RequestError`] so callers keep access to Telegram's
/// structured [`teloxide::ApiError`] kinds.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
  async fn send_message(&self, request: SendRequest) -> Result<Message, RequestError>;

  async fn edit_message_text(&self, request: EditTextRequest) -> Result<(), RequestError>;

  /// Replaces the inline keyboard; `None` removes it.
  async fn edit_message_reply_markup(
    &self,
    chat_id: i64,
    message_id: i32,
    markup: Option<InlineKeyboardMarkup>,
  ) -> Result<(), RequestError>;

  async fn delete_message(&self, chat_id: i64, message_id: i32) -> Result<(), RequestError>;

  async fn answer_callback_query(&self, query_id: &str, text: Option<&str>) -> Result<bool, RequestError>;

  /// One long-poll round-trip.
  async fn get_updates(&self, request: PollRequest) -> Result<Vec<Update>, RequestError>;
}

/// [`Transport`] backed by a teloxide [`Bot`].
#[derive(Clone)]
pub struct TelegramTransport {
  bot: Bot,
}

impl TelegramTransport {
  pub fn new(token: impl Into<String>) -> Self {
    Self { bot: Bot::new(token) }
  }

  pub fn from_bot(bot: Bot) -> Self {
    Self { bot }
  }
}

fn link_preview(disabled: bool) -> LinkPreviewOptions {
  LinkPreviewOptions {
    is_disabled: disabled,
    url: None,
    prefer_small_media: false,
    prefer_large_media: false,
    show_above_text: false,
  }
}

#[async_trait]
impl Transport for TelegramTransport {
  #[instrument(skip(self, request), fields(chat_id = request.chat_id))]
  async fn send_message(&self, request: SendRequest) -> Result<Message, RequestError> {
    let mut call = self
      .bot
      .send_message(ChatId(request.chat_id), request.text)
      .link_preview_options(link_preview(request.disable_link_preview));
    if let Some(mode) = request.parse_mode {
      call = call.parse_mode(mode);
    }
    if let Some(thread) = request.thread_id {
      call = call.message_thread_id(ThreadId(MessageId(thread)));
    }
    if let Some(markup) = request.reply_markup {
      call = call.reply_markup(markup);
    }

    let sent = call.await?;
    debug!(message_id = sent.id.0, "message sent");
    Ok(Message::from(&sent))
  }

  #[instrument(skip(self, request), fields(chat_id = request.chat_id, message_id = request.message_id))]
  async fn edit_message_text(&self, request: EditTextRequest) -> Result<(), RequestError> {
    let mut call = self
      .bot
      .edit_message_text(ChatId(request.chat_id), MessageId(request.message_id), request.text)
      .link_preview_options(link_preview(request.disable_link_preview));
    if let Some(mode) = request.parse_mode {
      call = call.parse_mode(mode);
    }
    if let Some(markup) = request.reply_markup {
      call = call.reply_markup(markup);
    }

    call.await?;
    Ok(())
  }

  #[instrument(skip(self, markup))]
  async fn edit_message_reply_markup(
    &self,
    chat_id: i64,
    message_id: i32,
    markup: Option<InlineKeyboardMarkup>,
  ) -> Result<(), RequestError> {
    let mut call = self.bot.edit_message_reply_markup(ChatId(chat_id), MessageId(message_id));
    if let Some(markup) = markup {
      call = call.reply_markup(markup);
    }

    call.await?;
    Ok(())
  }

  #[instrument(skip(self))]
  async fn delete_message(&self, chat_id: i64, message_id: i32) -> Result<(), RequestError> {
    self.bot.delete_message(ChatId(chat_id), MessageId(message_id)).await?;
    Ok(())
  }

  #[instrument(skip(self, text))]
  async fn answer_callback_query(&self, query_id: &str, text: Option<&str>) -> Result<bool, RequestError> {
    let mut call = self.bot.answer_callback_query(CallbackQueryId(query_id.to_owned()));
    if let Some(text) = text {
      call = call.text(text);
    }

    // Telegram answers `true` or an error; teloxide folds the former into `True`.
    call.await?;
    Ok(true)
  }

  #[instrument(skip(self))]
  async fn get_updates(&self, request: PollRequest) -> Result<Vec<Update>, RequestError> {
    let updates = self
      .bot
      .get_updates()
      .offset(request.offset)
      .limit(request.limit)
      .timeout(request.timeout_secs)
      .await?;
    debug!(count = updates.len(), "received updates");
    Ok(updates.into_iter().map(Update::from).collect())
  }
}
