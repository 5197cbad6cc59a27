pub mod webdriver;

pub use webdriver::BrowserSession;

use crate::error::NavigationError;
use crate::results::LogRecord;
use async_trait::async_trait;

/// Capability surface of a rendering engine as seen by the crawl loop
#[async_trait]
pub trait PageLoader: Send {
    /// Navigate to `url`, wait for it to settle and return the console records it produced
    async fn capture(&mut self, url: &str) -> Result<Vec<LogRecord>, NavigationError>;

    /// Release the underlying engine
    async fn close(&mut self) {}
}
