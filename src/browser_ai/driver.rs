use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::BrowserConfig;
use crate::error::Result;

/// Snapshot of a DOM node matched by a CSS selector. `index` is the node's
/// position in `document.querySelectorAll(selector)` at lookup time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementHandle {
    pub selector: String,
    pub index: usize,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub href: Option<String>,
}

/// The browser operations the review collector needs.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    async fn navigate(&self, url: &str) -> Result<()>;

    async fn find(&self, selector: &str) -> Result<Vec<ElementHandle>>;

    async fn click(&self, element: &ElementHandle) -> Result<()>;

    async fn scroll_to_bottom(&self) -> Result<()>;

    async fn page_height(&self) -> Result<u64>;

    /// Terminates the browser. Called at most once per driver by
    /// `BrowserSession`.
    async fn quit(&mut self) -> Result<()>;
}

/// Starts browser processes. Fails with `AppError::Launch`.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self, config: &BrowserConfig) -> Result<Box<dyn BrowserDriver>>;
}
