//! Browser capability used by the crawler
//!
//! The crawl never touches a browser engine directly. It talks to a
//! [`BrowserSession`], which exposes only the handful of page interactions the
//! portal needs: open, wait for a control, click it, read its parent's class,
//! wait for an overlay to go away, reload and close.
//!
//! - `chrome`: Chrome/Chromium implementation over the DevTools protocol
//! - `script`: JavaScript snippets used to resolve and inspect locators

#[cfg(feature = "browser")]
mod chrome;
mod script;

#[cfg(feature = "browser")]
pub use chrome::{resolve_websocket_url, ChromeSession};
pub use script::{
    click_script, is_clickable_script, is_hidden_script, parent_has_class_script, ParentClass,
};

use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// How to find an element on the page
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub enum Locator {
    /// CSS selector, first match wins
    #[serde(rename = "css")]
    Css(String),

    /// XPath expression, first node in document order wins
    #[serde(rename = "xpath")]
    XPath(String),
}

impl Locator {
    /// The raw selector or XPath expression
    pub fn expression(&self) -> &str {
        match self {
            Self::Css(s) | Self::XPath(s) => s,
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(s) => write!(f, "css:{}", s),
            Self::XPath(s) => write!(f, "xpath:{}", s),
        }
    }
}

/// Browser-level failures
#[derive(Debug, Error)]
pub enum BrowserError {
    /// A bounded wait expired
    #[error("Timed out after {waited_ms}ms waiting for {what}")]
    Timeout { what: String, waited_ms: u64 },

    /// The element vanished or was re-rendered between lookup and use
    #[error("Element {0} is no longer attached to the page")]
    Stale(String),

    #[error("Failed to start browser: {0}")]
    Launch(String),

    #[error("DevTools protocol error: {0}")]
    Protocol(String),

    #[error("Browser support not compiled in; rebuild with --features browser")]
    Unsupported,
}

impl BrowserError {
    /// Timeouts and stale elements are expected on a busy page and worth retrying
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Stale(_))
    }
}

pub type BrowserResult<T> = std::result::Result<T, BrowserError>;

/// One live connection to the remote listing
///
/// Implementations own the underlying browser; the crawler owns the session
/// exclusively and never shares it.
#[async_trait]
pub trait BrowserSession: Send {
    /// Navigates the session to `url`
    async fn open(&mut self, url: &str) -> BrowserResult<()>;

    /// Waits until the element is present, visible and enabled
    async fn wait_clickable(&mut self, target: &Locator, timeout: Duration) -> BrowserResult<()>;

    /// Clicks the element through the DOM, without waiting
    ///
    /// Fails with [`BrowserError::Stale`] when the element is gone.
    async fn click(&mut self, target: &Locator) -> BrowserResult<()>;

    /// Reports whether the element's parent carries `class`
    async fn parent_has_class(&mut self, target: &Locator, class: &str) -> BrowserResult<bool>;

    /// Waits until the element is absent or invisible
    async fn wait_hidden(&mut self, target: &Locator, timeout: Duration) -> BrowserResult<()>;

    /// Reloads the current page in place
    async fn reload(&mut self) -> BrowserResult<()>;

    /// Shuts the session down
    async fn close(&mut self) -> BrowserResult<()>;
}
