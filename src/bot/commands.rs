use once_cell::sync::Lazy;
use regex::Regex;

static COMMAND_PATTERN: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"(?s)^/(?P<name>[^\s@]+)(?:@(?P<bot>\S*))?\s*(?P<args>.*)$").expect("valid regex"));

/// A `/command@bot args` message split into its parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandText<'a> {
  pub name: &'a str,
  pub bot_username: Option<&'a str>,
  pub args: &'a str,
}

/// Text is a command when it starts with `/` followed by a name; a bare `/` is ordinary text.
pub fn parse_command(text: &str) -> Option<CommandText<'_>> {
  let caps = COMMAND_PATTERN.captures(text)?;
  Some(CommandText {
    name: caps.name("name").map_or("", |m| m.as_str()),
    bot_username: caps.name("bot").map(|m| m.as_str()).filter(|bot| !bot.is_empty()),
    args: caps.name("args").map_or("", |m| m.as_str()),
  })
}
