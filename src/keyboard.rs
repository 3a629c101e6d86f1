use serde::Deserialize;
use serde::Serialize;
use teloxide::types::InlineKeyboardButton;
use teloxide::types::InlineKeyboardMarkup;

/// A single inline button. The callback payload defaults to the label.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Button {
  pub text: String,
  pub callback_data: String,
}

impl Button {
  pub fn new(text: impl Into<String>, callback_data: impl Into<String>) -> Self {
    Self {
      text: text.into(),
      callback_data: callback_data.into(),
    }
  }
}

impl From<&str> for Button {
  fn from(text: &str) -> Self {
    Self::new(text, text)
  }
}

impl From<String> for Button {
  fn from(text: String) -> Self {
    Self {
      callback_data: text.clone(),
      text,
    }
  }
}

/// Rows of buttons, rendered top-to-bottom and left-to-right.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct KeyboardLayout {
  rows: Vec<Vec<Button>>,
}

impl KeyboardLayout {
  pub fn new(rows: Vec<Vec<Button>>) -> Self {
    Self { rows }
  }

  pub fn rows(&self) -> &[Vec<Button>] {
    &self.rows
  }

  pub fn push_row(&mut self, row: Vec<Button>) {
    self.rows.push(row);
  }

  pub fn is_empty(&self) -> bool {
    self.rows.is_empty()
  }
}

/// Builds a layout with exactly one row, one button per text.
///
/// An empty input still produces that single (empty) row.
pub fn single_row<I, S>(texts: I) -> KeyboardLayout
where
  I: IntoIterator<Item = S>,
  S: Into<String>,
{
  let row = texts.into_iter().map(|text| Button::from(text.into())).collect();
  KeyboardLayout::new(vec![row])
}

pub fn to_inline_markup(layout: &KeyboardLayout) -> InlineKeyboardMarkup {
  let rows: Vec<Vec<InlineKeyboardButton>> = layout
    .rows()
    .iter()
    .map(|row| {
      row
        .iter()
        .map(|button| InlineKeyboardButton::callback(button.text.clone(), button.callback_data.clone()))
        .collect()
    })
    .collect();

  InlineKeyboardMarkup::new(rows)
}

impl From<&KeyboardLayout> for InlineKeyboardMarkup {
  fn from(layout: &KeyboardLayout) -> Self {
    to_inline_markup(layout)
  }
}
