use std::fmt;
use std::str::FromStr;

use teloxide::types::ParseMode;
use teloxide::utils::html;
use teloxide::utils::markdown;
use thiserror::Error;

/// Text-formatting dialect applied to outgoing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
  #[default]
  Html,
  MarkdownV2,
  Plain,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unsupported render mode `{0}` (expected HTML, MarkdownV2 or plain)")]
pub struct RenderModeError(pub String);

impl FromStr for RenderMode {
  type Err = RenderModeError;

  fn from_str(raw: &str) -> Result<Self, Self::Err> {
    match raw.trim().to_ascii_lowercase().as_str() {
      "html" => Ok(Self::Html),
      "markdownv2" => Ok(Self::MarkdownV2),
      "" | "plain" | "none" => Ok(Self::Plain),
      _ => Err(RenderModeError(raw.to_string())),
    }
  }
}

impl fmt::Display for RenderMode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Self::Html => "HTML",
      Self::MarkdownV2 => "MarkdownV2",
      Self::Plain => "plain",
    };
    f.write_str(name)
  }
}

impl RenderMode {
  pub fn parse_mode(self) -> Option<ParseMode> {
    match self {
      Self::Html => Some(ParseMode::Html),
      Self::MarkdownV2 => Some(ParseMode::MarkdownV2),
      Self::Plain => None,
    }
  }

  /// Link markup in this dialect. Plain mode falls back to `text (url)`.
  pub fn link(self, url: &str, text: &str) -> String {
    match self {
      // html::link escapes the text itself
      Self::Html => html::link(url, text),
      Self::MarkdownV2 => markdown::link(url, &markdown::escape(text)),
      Self::Plain => format!("{text} ({url})"),
    }
  }

  pub fn escape(self, text: &str) -> String {
    match self {
      Self::Html => html::escape(text),
      Self::MarkdownV2 => markdown::escape(text),
      Self::Plain => text.to_string(),
    }
  }
}
