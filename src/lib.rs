//! A small facade over a Telegram Bot API client.
//!
//! [`BotFacade`] wraps message send/edit/delete calls, callback-query answers,
//! inline keyboards and handler binding, and keeps every transport failure out
//! of the caller's way by reporting it to a single log sink.

pub mod app;
pub mod bot;
pub mod config;
pub mod keyboard;
pub mod telemetry;
pub mod transport;
pub mod types;
pub mod util;

#[cfg(test)]
mod testing;

pub use bot::BotFacade;
pub use bot::FacadeError;
pub use keyboard::Button;
pub use keyboard::KeyboardLayout;
pub use util::RenderMode;
