pub mod commands;
mod facade;
mod handlers;
mod runner;

pub type HandlerResult = anyhow::Result<()>;

pub use commands::CommandText;
pub use commands::parse_command;
pub use facade::BotFacade;
pub use facade::FacadeError;
pub use facade::LogSink;
pub use facade::PollSettings;
pub use handlers::HandlerFuture;
