// Re-export modules
pub mod browser;
pub mod config;
pub mod error;
pub mod filter;
pub mod orchestrator;
pub mod output;
pub mod results;
pub mod sitemap;

// Re-export commonly used types for convenience
pub use config::RunConfiguration;
pub use error::AuditError;
pub use results::{LogRecord, RunSummary, Severity};

use browser::BrowserSession;
use sitemap::{HttpFetcher, SitemapResolver};
use url::Url;

/// Main builder for a sitemap console audit
pub struct ConsoleAudit {
    sitemap_url: String,
    config: RunConfiguration,
}

impl ConsoleAudit {
    /// Create a new audit of the given root sitemap with default settings
    pub fn new(sitemap_url: impl Into<String>) -> Self {
        Self {
            sitemap_url: sitemap_url.into(),
            config: RunConfiguration::default(),
        }
    }

    /// Replace the run configuration
    pub fn with_config(mut self, config: RunConfiguration) -> Self {
        self.config = config;
        self
    }

    /// Load the run configuration from a JSON file
    pub fn with_config_file(self, path: impl AsRef<std::path::Path>) -> Result<Self, AuditError> {
        let config = RunConfiguration::from_file(path)?;
        Ok(self.with_config(config))
    }

    pub fn config(&self) -> &RunConfiguration {
        &self.config
    }

    /// Check the root URL is an absolute http(s) URL
    fn root_url(&self) -> Result<Url, AuditError> {
        let trimmed = self.sitemap_url.trim();
        match Url::parse(trimmed) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(url),
            _ => Err(AuditError::InvalidRootUrl(trimmed.to_string())),
        }
    }

    /// Resolve the sitemap, then crawl every page and persist its console records
    pub async fn run(self) -> Result<RunSummary, AuditError> {
        let root = self.root_url()?;
        self.config.validate()?;

        let fetcher = HttpFetcher::new(&self.config).map_err(|source| {
            error::ResolutionError::Fetch {
                url: root.to_string(),
                source,
            }
        })?;
        let urls = SitemapResolver::new(fetcher).resolve(root.as_str()).await?;

        if urls.is_empty() {
            ::log::warn!(
                "No page URLs were extracted from the provided sitemap. Check URL and sitemap format."
            );
            return Ok(RunSummary::default());
        }

        let mut session = BrowserSession::connect(&self.config).await?;
        orchestrator::run(&urls, &mut session, &self.config).await
    }
}
