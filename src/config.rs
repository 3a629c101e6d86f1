use std::env;

use anyhow::Context;
use anyhow::Result;

use crate::bot::PollSettings;
use crate::util::RenderMode;

const MAX_POLL_LIMIT: u8 = 100;

#[derive(Debug, Clone)]
pub struct Config {
  pub bot_token: String,
  pub render_mode: RenderMode,
  pub disable_link_preview: bool,
  pub poll: PollSettings,
}

impl Config {
  pub fn from_env() -> Result<Self> {
    Self::from_lookup(|key| env::var(key).ok())
  }

  /// Builds the config from any key lookup, so tests need not touch the process environment.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let bot_token = lookup("BOT_TOKEN")
      .or_else(|| lookup("TELOXIDE_TOKEN"))
      .filter(|token| !token.trim().is_empty())
      .context("BOT_TOKEN or TELOXIDE_TOKEN must be set")?;

    let render_mode = match lookup("PARSE_MODE") {
      Some(raw) => raw.parse::<RenderMode>().context("invalid PARSE_MODE")?,
      None => RenderMode::default(),
    };

    let disable_link_preview = lookup("LINK_PREVIEW")
      .and_then(|raw| parse_flag("LINK_PREVIEW", &raw))
      .map_or(true, |enabled| !enabled);

    let defaults = PollSettings::default();
    let timeout_secs = lookup("POLL_TIMEOUT_SECS")
      .and_then(|raw| parse_number::<u32>("POLL_TIMEOUT_SECS", &raw))
      .map_or(defaults.timeout_secs, clamp_poll_timeout);
    let limit = lookup("POLL_LIMIT")
      .and_then(|raw| parse_number::<u8>("POLL_LIMIT", &raw))
      .map_or(defaults.limit, |limit| limit.clamp(1, MAX_POLL_LIMIT));

    Ok(Self {
      bot_token,
      render_mode,
      disable_link_preview,
      poll: PollSettings { timeout_secs, limit },
    })
  }
}

fn clamp_poll_timeout(secs: u32) -> u32 {
  if secs > PollSettings::MAX_TIMEOUT_SECS {
    tracing::warn!(
      requested = secs,
      max = PollSettings::MAX_TIMEOUT_SECS,
      "POLL_TIMEOUT_SECS exceeds the HTTP client timeout, clamping"
    );
    return PollSettings::MAX_TIMEOUT_SECS;
  }
  secs
}

fn parse_flag(key: &str, raw: &str) -> Option<bool> {
  match raw.trim().to_ascii_lowercase().as_str() {
    "1" | "true" | "yes" | "on" => Some(true),
    "0" | "false" | "no" | "off" => Some(false),
    other => {
      tracing::warn!(key, value = other, "invalid boolean setting, using default");
      None
    },
  }
}

fn parse_number<N>(key: &str, raw: &str) -> Option<N>
where
  N: std::str::FromStr,
  N::Err: std::fmt::Display,
{
  let trimmed = raw.trim();
  match trimmed.parse::<N>() {
    Ok(value) => Some(value),
    Err(err) => {
      tracing::warn!(key, value = trimmed, error = %err, "invalid numeric setting, using default");
      None
    },
  }
}
