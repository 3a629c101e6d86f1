use std::process::ExitCode;
use std::sync::Arc;

use chrono::Utc;
use teloxide::utils::command::BotCommands;
use tracing::info;

use crate::bot::BotFacade;
use crate::bot::HandlerResult;
use crate::config::Config;
use crate::keyboard::Button;
use crate::keyboard::KeyboardLayout;
use crate::keyboard::single_row;
use crate::transport::TelegramTransport;
use crate::transport::Transport;
use crate::types::CallbackQuery;
use crate::types::Message;

const MENU_TEXT: &str = "What would you like to do?";

/// Commands the demo answers; the derive only feeds `/help`, routing goes through the facade.
#[derive(BotCommands, Clone, Debug)]
#[command(rename_rule = "lowercase", description = "This bot echoes text and offers a small menu:")]
pub enum MenuCommand {
  /// Show the Ping / Time keyboard
  Start,
  /// List what this bot understands
  Help,
}

/// Demo bot: a menu keyboard, callback handling and an echo.
pub struct App {
  bot: Arc<BotFacade<TelegramTransport>>,
}

impl App {
  pub fn new(config: &Config) -> Self {
    let bot = Arc::new(BotFacade::from_config(config));
    bind_handlers(&bot);
    Self { bot }
  }

  pub async fn run(self) -> ExitCode {
    self.bot.run().await
  }
}

pub fn bind_handlers<T: Transport>(bot: &BotFacade<T>) {
  bot.bind_on_command("start", handle_start::<T>);
  bot.bind_on_command("help", handle_help::<T>);
  bot.bind_on_unknown_command(handle_unknown_command::<T>);
  bot.bind_on_message(handle_text::<T>);
  bot.bind_on_callback_query(handle_callback_query::<T>);
}

pub fn menu_layout() -> KeyboardLayout {
  let mut layout = single_row(["Ping", "Time"]);
  layout.push_row(vec![Button::new("Close menu", "close")]);
  layout
}

async fn handle_start<T: Transport>(bot: Arc<BotFacade<T>>, msg: Message) -> HandlerResult {
  info!(chat_id = msg.chat.id, "received /start command");
  bot.send_keyboard(&msg, MENU_TEXT, &menu_layout()).await;
  Ok(())
}

async fn handle_help<T: Transport>(bot: Arc<BotFacade<T>>, msg: Message) -> HandlerResult {
  let text = bot.current_render_mode().escape(&MenuCommand::descriptions().to_string());
  bot.send_message(&msg, &text).await;
  Ok(())
}

async fn handle_unknown_command<T: Transport>(bot: Arc<BotFacade<T>>, msg: Message) -> HandlerResult {
  bot.send_message(&msg, "Unknown command. Use /help.").await;
  Ok(())
}

async fn handle_text<T: Transport>(bot: Arc<BotFacade<T>>, msg: Message) -> HandlerResult {
  // stickers, photos and the like carry no text
  let Some(text) = msg.text() else {
    return Ok(());
  };
  let reply = format!("You said: {}", bot.current_render_mode().escape(text));
  bot.send_message(&msg, &reply).await;
  Ok(())
}

async fn handle_callback_query<T: Transport>(bot: Arc<BotFacade<T>>, query: CallbackQuery) -> HandlerResult {
  let data = query.data.as_deref().unwrap_or_default();
  info!(user_id = query.from_id, callback = data, "handling callback query");

  match (data, &query.message) {
    ("Ping", _) => {
      bot.answer_callback_query(&query.id, "Pong").await;
    },
    ("Time", Some(message)) => {
      bot.answer_callback_query(&query.id, "").await;
      let text = format!("Server time: {} UTC", Utc::now().format("%H:%M:%S"));
      bot.edit_message_with_keyboard(message, &text, &menu_layout()).await;
    },
    ("close", Some(message)) => {
      bot.answer_callback_query(&query.id, "").await;
      bot.delete_message(message).await;
    },
    _ => {
      bot.answer_callback_query(&query.id, "Nothing to do here").await;
    },
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use super::bind_handlers;
  use super::menu_layout;
  use crate::bot::BotFacade;
  use crate::testing::Call;
  use crate::testing::MockTransport;
  use crate::testing::callback_query;
  use crate::testing::message_in;
  use crate::testing::private_chat;
  use crate::testing::update;
  use crate::types::UpdateKind;

  fn demo_bot() -> Arc<BotFacade<MockTransport>> {
    let bot = Arc::new(BotFacade::with_transport(MockTransport::default()));
    bind_handlers(&bot);
    bot
  }

  #[test]
  fn menu_has_two_rows() {
    let layout = menu_layout();
    let shape: Vec<usize> = layout.rows().iter().map(Vec::len).collect();
    assert_eq!(shape, vec![2, 1]);
    assert_eq!(layout.rows()[1][0].callback_data, "close");
  }

  #[tokio::test]
  async fn start_sends_menu_keyboard() {
    let bot = demo_bot();
    bot
      .dispatch(update(1, UpdateKind::Message(message_in(private_chat(), "/start"))))
      .await;

    assert!(matches!(
      &bot.transport().calls()[..],
      [Call::Send { markup_rows: Some(2), .. }]
    ));
  }

  #[tokio::test]
  async fn echo_escapes_markup() {
    let bot = demo_bot();
    bot
      .dispatch(update(1, UpdateKind::Message(message_in(private_chat(), "<b>hi</b>"))))
      .await;

    match &bot.transport().calls()[..] {
      [Call::Send { text, .. }] => assert_eq!(text, "You said: &lt;b&gt;hi&lt;/b&gt;"),
      other => panic!("unexpected calls {other:?}"),
    }
  }

  #[tokio::test]
  async fn close_button_deletes_menu() {
    let bot = demo_bot();
    bot
      .dispatch(update(2, UpdateKind::CallbackQuery(callback_query("q1", "close"))))
      .await;

    let calls = bot.transport().calls();
    assert!(matches!(calls[0], Call::Answer { .. }));
    assert!(matches!(calls[1], Call::Delete { .. }));
  }

  #[tokio::test]
  async fn time_button_edits_text_and_keeps_keyboard() {
    let bot = demo_bot();
    bot
      .dispatch(update(2, UpdateKind::CallbackQuery(callback_query("q1", "Time"))))
      .await;

    match &bot.transport().calls()[1] {
      Call::EditText { text, markup_rows, .. } => {
        assert!(text.starts_with("Server time: "));
        assert_eq!(*markup_rows, Some(2));
      },
      other => panic!("unexpected call {other:?}"),
    }
  }

  #[tokio::test]
  async fn help_lists_menu_commands() {
    let bot = demo_bot();
    bot
      .dispatch(update(1, UpdateKind::Message(message_in(private_chat(), "/help"))))
      .await;

    match &bot.transport().calls()[..] {
      [Call::Send { text, markup_rows: None, .. }] => {
        assert!(text.starts_with("This bot echoes text"));
        assert!(text.contains("/start"));
        assert!(text.contains("/help"));
      },
      other => panic!("unexpected calls {other:?}"),
    }
  }

  #[tokio::test]
  async fn unknown_commands_get_a_hint() {
    let bot = demo_bot();
    bot
      .dispatch(update(1, UpdateKind::Message(message_in(private_chat(), "/bogus"))))
      .await;

    assert!(matches!(
      &bot.transport().calls()[..],
      [Call::Send { text, .. }] if text.contains("/help")
    ));
  }
}
