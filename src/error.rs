use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating a run configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Errors raised by a sitemap fetch primitive
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected HTTP status {status}")]
    Status { status: u16 },

    #[error("Not found")]
    NotFound,
}

/// A sitemap body that is neither a sitemap index nor a URL set
#[derive(Debug, Error)]
pub enum SitemapParseError {
    #[error("Unrecognized sitemap document: no <urlset> or <sitemapindex> element")]
    UnrecognizedRoot,
}

/// Failure to resolve one sitemap document
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("Invalid sitemap URL {url}: {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },

    #[error("Failed to fetch sitemap {url}: {source}")]
    Fetch { url: String, source: FetchError },

    #[error("Sitemap is empty: {url}")]
    EmptyDocument { url: String },

    #[error("Failed to parse sitemap {url}: {source}")]
    Parse {
        url: String,
        source: SitemapParseError,
    },
}

/// A single page failed to load or report its console records
#[derive(Debug, Clone, Error)]
pub enum NavigationError {
    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Session lost: {0}")]
    SessionLost(String),

    #[error("Browser error: {0}")]
    Engine(String),
}

impl NavigationError {
    /// Short name of the error kind, used in failure log entries
    pub fn kind(&self) -> &'static str {
        match self {
            NavigationError::Timeout(_) => "Timeout",
            NavigationError::SessionLost(_) => "SessionLost",
            NavigationError::Engine(_) => "Engine",
        }
    }

    /// Whether the browser session has to be re-established before the next page
    pub fn requires_reconnect(&self) -> bool {
        matches!(self, NavigationError::SessionLost(_))
    }
}

/// The browser session could not be started at all
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Failed to connect to any WebDriver server (tried {tried})")]
    Connect { tried: String },

    #[error("Failed to configure browser session: {0}")]
    Setup(String),
}

/// Filesystem failures in the output writer
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("Failed to create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write log file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Errors that abort a whole run
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Invalid root sitemap URL {0}: expected an absolute http:// or https:// URL")]
    InvalidRootUrl(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    OutputDirectory(#[from] WriteError),
}
