use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::PoisonError;
use std::sync::RwLockWriteGuard;

use futures::FutureExt;
use futures::future::BoxFuture;
use tracing::debug;
use tracing::instrument;

use crate::bot::BotFacade;
use crate::bot::HandlerResult;
use crate::bot::commands::parse_command;
use crate::transport::Transport;
use crate::types::CallbackQuery;
use crate::types::Message;
use crate::types::Update;
use crate::types::UpdateKind;

pub type HandlerFuture = BoxFuture<'static, HandlerResult>;

type Handler<T, A> = Arc<dyn Fn(Arc<BotFacade<T>>, A) -> HandlerFuture + Send + Sync>;

/// Bound callbacks, keyed by event class and, for commands, by name.
pub(crate) struct HandlerTable<T: Transport> {
  on_message: Vec<Handler<T, Message>>,
  on_unknown_command: Vec<Handler<T, Message>>,
  on_command: HashMap<String, Handler<T, Message>>,
  on_callback_query: Vec<Handler<T, CallbackQuery>>,
}

impl<T: Transport> Default for HandlerTable<T> {
  fn default() -> Self {
    Self {
      on_message: Vec::new(),
      on_unknown_command: Vec::new(),
      on_command: HashMap::new(),
      on_callback_query: Vec::new(),
    }
  }
}

fn boxed<T, A, F, Fut>(callback: F) -> Handler<T, A>
where
  T: Transport,
  F: Fn(Arc<BotFacade<T>>, A) -> Fut + Send + Sync + 'static,
  Fut: Future<Output = HandlerResult> + Send + 'static,
{
  Arc::new(move |bot, arg| callback(bot, arg).boxed())
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
  payload
    .downcast_ref::<&str>()
    .copied()
    .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
    .unwrap_or("non-string panic payload")
}

impl<T: Transport> BotFacade<T> {
  /// Messages that are not commands, including ones without text.
  pub fn bind_on_message<F, Fut>(&self, callback: F)
  where
    F: Fn(Arc<BotFacade<T>>, Message) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
  {
    self.table_mut().on_message.push(boxed(callback));
  }

  /// Commands without a handler of their own.
  pub fn bind_on_unknown_command<F, Fut>(&self, callback: F)
  where
    F: Fn(Arc<BotFacade<T>>, Message) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
  {
    self.table_mut().on_unknown_command.push(boxed(callback));
  }

  /// Binds `/command`; a later binding for the same name replaces this one.
  pub fn bind_on_command<F, Fut>(&self, command: &str, callback: F)
  where
    F: Fn(Arc<BotFacade<T>>, Message) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
  {
    self.bind_on_commands(&[command], callback);
  }

  pub fn bind_on_commands<F, Fut>(&self, commands: &[&str], callback: F)
  where
    F: Fn(Arc<BotFacade<T>>, Message) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
  {
    let handler = boxed(callback);
    let mut table = self.table_mut();
    for command in commands {
      let name = command.trim_start_matches('/').to_string();
      table.on_command.insert(name, Arc::clone(&handler));
    }
  }

  pub fn bind_on_callback_query<F, Fut>(&self, callback: F)
  where
    F: Fn(Arc<BotFacade<T>>, CallbackQuery) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
  {
    self.table_mut().on_callback_query.push(boxed(callback));
  }

  fn table_mut(&self) -> RwLockWriteGuard<'_, HandlerTable<T>> {
    self.handlers.write().unwrap_or_else(PoisonError::into_inner)
  }

  /// Runs every handler bound for `update`, one after another.
  #[instrument(skip(self, update), fields(update_id = update.id))]
  pub async fn dispatch(self: &Arc<Self>, update: Update) {
    match update.kind {
      UpdateKind::Message(msg) => self.dispatch_message(msg).await,
      UpdateKind::CallbackQuery(query) => {
        let handlers = self
          .handlers
          .read()
          .unwrap_or_else(PoisonError::into_inner)
          .on_callback_query
          .clone();
        for handler in handlers {
          let bot = Arc::clone(self);
          let query = query.clone();
          self.best_effort("callback query", async move { handler(bot, query).await }).await;
        }
      },
      UpdateKind::Other => debug!("no handlers for update kind"),
    }
  }

  async fn dispatch_message(self: &Arc<Self>, msg: Message) {
    let command = msg.text().and_then(parse_command).map(|cmd| cmd.name.to_string());

    let (event, handlers) = {
      let table = self.handlers.read().unwrap_or_else(PoisonError::into_inner);
      match &command {
        Some(name) => match table.on_command.get(name) {
          Some(handler) => (format!("command /{name}"), vec![Arc::clone(handler)]),
          None => (format!("unknown command /{name}"), table.on_unknown_command.clone()),
        },
        None => ("message".to_string(), table.on_message.clone()),
      }
    };

    debug!(chat_id = msg.chat.id, event = %event, count = handlers.len(), "dispatching message");
    for handler in handlers {
      let bot = Arc::clone(self);
      let msg = msg.clone();
      self.best_effort(&event, async move { handler(bot, msg).await }).await;
    }
  }

  /// Awaits a handler, logging its error or panic instead of propagating it.
  async fn best_effort<Fut>(&self, event: &str, call: Fut)
  where
    Fut: Future<Output = HandlerResult>,
  {
    match AssertUnwindSafe(call).catch_unwind().await {
      Ok(Ok(())) => {},
      Ok(Err(err)) => self.log(format!("Handler for {event} failed: {err:#}")),
      Err(payload) => self.log(format!("Handler for {event} panicked: {}", panic_message(&*payload))),
    }
  }
}
