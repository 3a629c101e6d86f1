use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

use crate::bot::LogSink;

pub fn init(default_filter: &str) -> Result<()> {
  let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
  fmt()
    .with_env_filter(env_filter)
    .with_target(true)
    .try_init()
    .map_err(|err| anyhow::anyhow!("failed to install tracing subscriber: {err}"))?;
  Ok(())
}

/// Default facade log sink: every line becomes an `info` event on the `bot` target.
pub fn tracing_sink() -> LogSink {
  Arc::new(|line: &str| tracing::info!(target: "bot", "{line}"))
}
