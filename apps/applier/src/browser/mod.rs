//! Browser capability interface consumed by the form-filling core.
//!
//! The core never launches or tears down a browser; it is handed a page that
//! implements `BrowserPage` and drives it one awaited action at a time.

use std::path::Path;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub mod cdp;
#[cfg(test)]
pub mod mock;

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Element not found: {0}")]
    NotFound(String),

    #[error("Element not visible: {0}")]
    NotVisible(String),

    #[error("No option matching {0}")]
    OptionNotFound(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Script error: {0}")]
    Script(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Browser disconnected: {0}")]
    Disconnected(String),
}

impl BrowserError {
    /// Fatal errors mean the page itself is gone; everything else is local to
    /// one element and is reported per field.
    pub fn is_fatal(&self) -> bool {
        matches!(self, BrowserError::Disconnected(_))
    }
}

/// How a `<select>` option is matched. Both are exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectBy<'a> {
    Label(&'a str),
    Value(&'a str),
}

impl std::fmt::Display for SelectBy<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectBy::Label(label) => write!(f, "label '{label}'"),
            SelectBy::Value(value) => write!(f, "value '{value}'"),
        }
    }
}

/// A single browser page. Selector-addressed actions operate on the first
/// element matching the CSS selector.
#[async_trait]
pub trait BrowserPage: Send + Sync {
    type Element: Send + Sync;

    async fn navigate(&self, url: &str) -> Result<(), BrowserError>;

    async fn query_one(&self, selector: &str) -> Result<Option<Self::Element>, BrowserError>;

    async fn query_all(&self, selector: &str) -> Result<Vec<Self::Element>, BrowserError>;

    /// Replaces the control's value with `text` as if typed.
    async fn fill(&self, selector: &str, text: &str) -> Result<(), BrowserError>;

    async fn select_option(&self, selector: &str, by: SelectBy<'_>) -> Result<(), BrowserError>;

    async fn check(&self, selector: &str) -> Result<(), BrowserError>;

    async fn set_input_files(&self, selector: &str, path: &Path) -> Result<(), BrowserError>;

    async fn click(&self, element: &Self::Element) -> Result<(), BrowserError>;

    async fn is_visible(&self, element: &Self::Element) -> Result<bool, BrowserError>;

    async fn inner_text(&self, element: &Self::Element) -> Result<String, BrowserError>;

    async fn get_attribute(
        &self,
        element: &Self::Element,
        name: &str,
    ) -> Result<Option<String>, BrowserError>;

    /// Reads a live DOM property (`type`, `required`, `value`, ...).
    async fn property(&self, element: &Self::Element, name: &str)
        -> Result<Option<Value>, BrowserError>;

    /// Lower-cased tag name.
    async fn tag_name(&self, element: &Self::Element) -> Result<String, BrowserError>;

    /// Text of the closest ancestor `<label>`, if any.
    async fn enclosing_label_text(
        &self,
        element: &Self::Element,
    ) -> Result<Option<String>, BrowserError>;

    async fn screenshot(&self, path: &Path) -> Result<(), BrowserError>;

    async fn wait(&self, millis: u64);
}
