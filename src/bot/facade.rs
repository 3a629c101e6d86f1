use std::sync::Arc;
use std::sync::PoisonError;
use std::sync::RwLock;

use teloxide::ApiError;
use teloxide::RequestError;
use teloxide::types::InlineKeyboardMarkup;
use teloxide::types::ReplyMarkup;
use thiserror::Error;
use tracing::debug;
use tracing::instrument;

use crate::bot::handlers::HandlerTable;
use crate::config::Config;
use crate::keyboard::KeyboardLayout;
use crate::keyboard::to_inline_markup;
use crate::telemetry;
use crate::transport::EditTextRequest;
use crate::transport::SendRequest;
use crate::transport::TelegramTransport;
use crate::transport::Transport;
use crate::types::Message;
use crate::util::RenderMode;

/// Receives every line the facade logs: failures and lifecycle markers.
pub type LogSink = Arc<dyn Fn(&str) + Send + Sync>;

#[derive(Debug, Error)]
pub enum FacadeError {
  #[error("can't send empty messages")]
  EmptyText,
  #[error(transparent)]
  Request(#[from] RequestError),
}

impl FacadeError {
  /// Telegram's own error kind, when the failure came from the Bot API.
  pub fn api_error(&self) -> Option<&ApiError> {
    match self {
      Self::Request(RequestError::Api(api)) => Some(api),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
  pub timeout_secs: u32,
  pub limit: u8,
}

impl PollSettings {
  /// Long-poll wait must stay under the HTTP client's 17 second request timeout.
  pub const MAX_TIMEOUT_SECS: u32 = 15;
}

impl Default for PollSettings {
  fn default() -> Self {
    Self {
      timeout_secs: 10,
      limit: 100,
    }
  }
}

/// Thin facade over a Bot API [`Transport`].
///
/// Message operations never return errors: failures are reported to the log
/// sink and turned into `None`, `false` or nothing. The `try_*` variants keep
/// the error for callers that want to inspect it.
pub struct BotFacade<T: Transport = TelegramTransport> {
  pub(super) transport: T,
  render_mode: RenderMode,
  disable_link_preview: bool,
  pub(super) poll: PollSettings,
  log_sink: RwLock<LogSink>,
  pub(super) handlers: RwLock<HandlerTable<T>>,
}

impl BotFacade<TelegramTransport> {
  pub fn new(token: impl Into<String>) -> Self {
    Self::with_transport(TelegramTransport::new(token))
  }

  pub fn from_config(config: &Config) -> Self {
    Self::new(config.bot_token.clone())
      .render_mode(config.render_mode)
      .disable_link_preview(config.disable_link_preview)
      .poll_settings(config.poll)
  }
}

impl<T: Transport> BotFacade<T> {
  pub fn with_transport(transport: T) -> Self {
    Self {
      transport,
      render_mode: RenderMode::default(),
      disable_link_preview: true,
      poll: PollSettings::default(),
      log_sink: RwLock::new(telemetry::tracing_sink()),
      handlers: RwLock::new(HandlerTable::default()),
    }
  }

  pub fn render_mode(mut self, mode: RenderMode) -> Self {
    self.render_mode = mode;
    self
  }

  pub fn disable_link_preview(mut self, disabled: bool) -> Self {
    self.disable_link_preview = disabled;
    self
  }

  pub fn poll_settings(mut self, poll: PollSettings) -> Self {
    self.poll = poll;
    self
  }

  pub fn transport(&self) -> &T {
    &self.transport
  }

  pub fn current_render_mode(&self) -> RenderMode {
    self.render_mode
  }

  /// Replaces the log sink.
  pub fn bind_on_log<F>(&self, sink: F)
  where
    F: Fn(&str) + Send + Sync + 'static,
  {
    let sink: LogSink = Arc::new(sink);
    *self.log_sink.write().unwrap_or_else(PoisonError::into_inner) = sink;
  }

  pub fn log(&self, line: impl AsRef<str>) {
    let sink = self.log_sink.read().unwrap_or_else(PoisonError::into_inner).clone();
    sink(line.as_ref());
  }

  pub async fn send_message(&self, source: &Message, text: &str) -> Option<Message> {
    self.deliver(source, text, None).await
  }

  pub async fn send_message_with_markup(&self, source: &Message, text: &str, markup: ReplyMarkup) -> Option<Message> {
    self.deliver(source, text, Some(markup)).await
  }

  pub async fn send_keyboard(&self, source: &Message, text: &str, layout: &KeyboardLayout) -> Option<Message> {
    let markup = ReplyMarkup::InlineKeyboard(to_inline_markup(layout));
    self.deliver(source, text, Some(markup)).await
  }

  async fn deliver(&self, source: &Message, text: &str, markup: Option<ReplyMarkup>) -> Option<Message> {
    match self.try_send_message(source, text, markup).await {
      Ok(sent) => Some(sent),
      Err(FacadeError::EmptyText) => {
        self.log("Can't send empty messages");
        None
      },
      Err(err) => {
        self.log(format!(
          "Failed to send message to chat '{}' id {} reason {}",
          source.chat.display_name(),
          source.chat.id,
          err
        ));
        None
      },
    }
  }

  /// Sends `text` to the chat (and topic thread) `source` came from.
  #[instrument(skip(self, source, text, markup), fields(chat_id = source.chat.id))]
  pub async fn try_send_message(
    &self,
    source: &Message,
    text: &str,
    markup: Option<ReplyMarkup>,
  ) -> Result<Message, FacadeError> {
    if text.is_empty() {
      return Err(FacadeError::EmptyText);
    }

    let request = SendRequest {
      chat_id: source.chat.id,
      text: text.to_string(),
      parse_mode: self.render_mode.parse_mode(),
      disable_link_preview: self.disable_link_preview,
      thread_id: source.reply_thread(),
      reply_markup: markup,
    };
    let sent = self.transport.send_message(request).await?;
    debug!(message_id = sent.id, "sent message");
    Ok(sent)
  }

  /// Edits text and markup together, or only the markup when `text` is empty.
  pub async fn edit_message(&self, message: &Message, text: &str, markup: Option<InlineKeyboardMarkup>) {
    if let Err(err) = self.try_edit_message(message, text, markup).await {
      self.log(format!(
        "Failed to edit message {} in chat '{}' id {}: {}",
        message.id,
        message.chat.display_name(),
        message.chat.id,
        err
      ));
    }
  }

  pub async fn edit_message_keyboard(&self, message: &Message, layout: &KeyboardLayout) {
    self.edit_message(message, "", Some(to_inline_markup(layout))).await;
  }

  pub async fn edit_message_with_keyboard(&self, message: &Message, text: &str, layout: &KeyboardLayout) {
    self.edit_message(message, text, Some(to_inline_markup(layout))).await;
  }

  /// Replaces the text and drops any inline keyboard.
  pub async fn edit_message_text(&self, message: &Message, text: &str) {
    self.edit_message(message, text, None).await;
  }

  #[instrument(skip(self, message, text, markup), fields(chat_id = message.chat.id, message_id = message.id))]
  pub async fn try_edit_message(
    &self,
    message: &Message,
    text: &str,
    markup: Option<InlineKeyboardMarkup>,
  ) -> Result<(), FacadeError> {
    // Telegram rejects edits with empty text, so those only touch the keyboard.
    if text.is_empty() {
      self
        .transport
        .edit_message_reply_markup(message.chat.id, message.id, markup)
        .await?;
      debug!("edited message markup");
    } else {
      let request = EditTextRequest {
        chat_id: message.chat.id,
        message_id: message.id,
        text: text.to_string(),
        parse_mode: self.render_mode.parse_mode(),
        disable_link_preview: self.disable_link_preview,
        reply_markup: markup,
      };
      self.transport.edit_message_text(request).await?;
      debug!("edited message text");
    }
    Ok(())
  }

  pub async fn delete_message(&self, message: &Message) {
    if let Err(err) = self.try_delete_message(message).await {
      self.log(format!(
        "Failed to delete message {} from chat {}, id {}, reason: {}",
        message.id,
        message.chat.display_name(),
        message.chat.id,
        err
      ));
    }
  }

  #[instrument(skip(self, message), fields(chat_id = message.chat.id, message_id = message.id))]
  pub async fn try_delete_message(&self, message: &Message) -> Result<(), FacadeError> {
    self.transport.delete_message(message.chat.id, message.id).await?;
    debug!("deleted message");
    Ok(())
  }

  /// Acknowledges a callback query; a non-empty `text` is shown as a notification.
  pub async fn answer_callback_query(&self, query_id: &str, text: &str) -> bool {
    match self.try_answer_callback_query(query_id, text).await {
      Ok(confirmed) => confirmed,
      Err(err) => {
        self.log(format!("Failed to answer callback query {query_id}: {err}"));
        false
      },
    }
  }

  #[instrument(skip(self, text))]
  pub async fn try_answer_callback_query(&self, query_id: &str, text: &str) -> Result<bool, FacadeError> {
    let text = (!text.is_empty()).then_some(text);
    Ok(self.transport.answer_callback_query(query_id, text).await?)
  }
}
