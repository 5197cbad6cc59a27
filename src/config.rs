use crate::error::ConfigError;
use crate::results::Severity;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Immutable snapshot of every tunable for one audit run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfiguration {
    /// Folder the per-page log files are written to
    #[serde(default = "default_output_directory")]
    pub output_directory: PathBuf,

    /// Pause between successive page crawls, in milliseconds
    #[serde(default = "default_crawl_delay_ms")]
    pub crawl_delay_ms: u64,

    /// Write a sentinel file for pages with no qualifying console records
    #[serde(default)]
    pub create_empty_log_files: bool,

    /// Append a failure entry to a page's log file when navigation fails
    #[serde(default = "default_true")]
    pub write_failure_logs: bool,

    /// Default filter for the tool's own log output (overridden by RUST_LOG)
    #[serde(default = "default_script_log_level")]
    pub script_log_level: String,

    /// User agent for sitemap requests
    #[serde(default = "default_sitemap_user_agent")]
    pub sitemap_user_agent: String,

    /// Timeout for each sitemap request, in seconds
    #[serde(default = "default_sitemap_timeout_secs")]
    pub sitemap_timeout_secs: u64,

    /// User agent the browser presents to the site
    #[serde(default = "default_browser_user_agent")]
    pub browser_user_agent: String,

    #[serde(default = "default_true")]
    pub headless: bool,

    #[serde(default = "default_true")]
    pub disable_gpu: bool,

    #[serde(default = "default_true")]
    pub no_sandbox: bool,

    #[serde(default = "default_true")]
    pub disable_dev_shm_usage: bool,

    /// Initial window size as "WIDTH,HEIGHT"
    #[serde(default = "default_window_size")]
    pub window_size: String,

    /// Verbosity of the browser process itself ("0" for all, "3" for fatal)
    #[serde(default = "default_driver_log_level")]
    pub driver_log_level: String,

    #[serde(default = "default_page_load_timeout_secs")]
    pub page_load_timeout_secs: u64,

    #[serde(default = "default_script_timeout_secs")]
    pub script_timeout_secs: u64,

    /// Minimum console severity to keep (SEVERE, WARNING, INFO, DEBUG/ALL)
    #[serde(default = "default_browser_log_level")]
    pub browser_log_level: String,

    /// Case-insensitive substrings; matching console messages are dropped
    #[serde(default)]
    pub filter_log_messages: Vec<String>,

    /// URL for the WebDriver instance
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,
}

fn default_output_directory() -> PathBuf {
    PathBuf::from("console_errors")
}

fn default_crawl_delay_ms() -> u64 {
    1000
}

fn default_true() -> bool {
    true
}

fn default_script_log_level() -> String {
    "info".to_string()
}

fn default_sitemap_user_agent() -> String {
    "SitemapConsoleAudit/1.0 (+https://example.com/botinfo)".to_string()
}

fn default_sitemap_timeout_secs() -> u64 {
    30
}

fn default_browser_user_agent() -> String {
    "SitemapConsoleAudit/1.0 WebDriver (+https://example.com/botinfo)".to_string()
}

fn default_window_size() -> String {
    "1920,1080".to_string()
}

fn default_driver_log_level() -> String {
    "3".to_string()
}

fn default_page_load_timeout_secs() -> u64 {
    60
}

fn default_script_timeout_secs() -> u64 {
    30
}

fn default_browser_log_level() -> String {
    "SEVERE".to_string()
}

/// Default value for webdriver_url
fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

impl Default for RunConfiguration {
    fn default() -> Self {
        Self {
            output_directory: default_output_directory(),
            crawl_delay_ms: default_crawl_delay_ms(),
            create_empty_log_files: false,
            write_failure_logs: true,
            script_log_level: default_script_log_level(),
            sitemap_user_agent: default_sitemap_user_agent(),
            sitemap_timeout_secs: default_sitemap_timeout_secs(),
            browser_user_agent: default_browser_user_agent(),
            headless: true,
            disable_gpu: true,
            no_sandbox: true,
            disable_dev_shm_usage: true,
            window_size: default_window_size(),
            driver_log_level: default_driver_log_level(),
            page_load_timeout_secs: default_page_load_timeout_secs(),
            script_timeout_secs: default_script_timeout_secs(),
            browser_log_level: default_browser_log_level(),
            filter_log_messages: Vec::new(),
            webdriver_url: default_webdriver_url(),
        }
    }
}

impl RunConfiguration {
    /// Load configuration from a JSON file. Missing fields take their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut file = File::open(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        Self::from_json(&contents)
    }

    /// Parse configuration from a JSON string
    pub fn from_json(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that serde cannot check on its own
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.output_directory.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                field: "output_directory",
                reason: "must not be empty".to_string(),
            });
        }
        self.window_dimensions()?;
        self.severity_threshold()?;
        Ok(())
    }

    /// Parsed browser log level
    pub fn severity_threshold(&self) -> Result<Severity, ConfigError> {
        self.browser_log_level
            .parse()
            .map_err(|reason| ConfigError::Invalid {
                field: "browser_log_level",
                reason,
            })
    }

    /// Parsed window size as (width, height)
    pub fn window_dimensions(&self) -> Result<(u32, u32), ConfigError> {
        let invalid = || ConfigError::Invalid {
            field: "window_size",
            reason: format!("expected WIDTH,HEIGHT, got '{}'", self.window_size),
        };
        let (w, h) = self.window_size.split_once(',').ok_or_else(invalid)?;
        let width = w.trim().parse().map_err(|_| invalid())?;
        let height = h.trim().parse().map_err(|_| invalid())?;
        Ok((width, height))
    }

    pub fn crawl_delay(&self) -> Duration {
        Duration::from_millis(self.crawl_delay_ms)
    }

    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_secs(self.page_load_timeout_secs)
    }

    pub fn script_timeout(&self) -> Duration {
        Duration::from_secs(self.script_timeout_secs)
    }

    pub fn sitemap_timeout(&self) -> Duration {
        Duration::from_secs(self.sitemap_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_empty_json() {
        let config = RunConfiguration::from_json("{}").unwrap();
        assert_eq!(config.output_directory, PathBuf::from("console_errors"));
        assert_eq!(config.crawl_delay_ms, 1000);
        assert!(!config.create_empty_log_files);
        assert!(config.write_failure_logs);
        assert_eq!(config.severity_threshold().unwrap(), Severity::Severe);
        assert_eq!(config.window_dimensions().unwrap(), (1920, 1080));
        assert_eq!(config.webdriver_url, "http://localhost:4444");
    }

    #[test]
    fn test_partial_override() {
        let config = RunConfiguration::from_json(
            r#"{
                "output_directory": "out",
                "browser_log_level": "warning",
                "filter_log_messages": ["favicon.ico", "jquery-migrate"],
                "create_empty_log_files": true
            }"#,
        )
        .unwrap();
        assert_eq!(config.output_directory, PathBuf::from("out"));
        assert_eq!(config.severity_threshold().unwrap(), Severity::Warning);
        assert_eq!(config.filter_log_messages.len(), 2);
        assert!(config.create_empty_log_files);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(RunConfiguration::from_json(r#"{"browser_log_level": "LOUD"}"#).is_err());
        assert!(RunConfiguration::from_json(r#"{"window_size": "1920x1080"}"#).is_err());
        assert!(RunConfiguration::from_json(r#"{"output_directory": ""}"#).is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.json");
        std::fs::write(&path, r#"{"crawl_delay_ms": 250}"#).unwrap();

        let config = RunConfiguration::from_file(&path).unwrap();
        assert_eq!(config.crawl_delay(), Duration::from_millis(250));

        let missing = RunConfiguration::from_file(dir.path().join("missing.json"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }
}
