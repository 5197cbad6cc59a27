use clap::Parser;
use sitemap_console_audit::RunConfiguration;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "sitemap-console-audit")]
#[command(about = "Crawls every page in a sitemap and logs browser console errors per page")]
#[command(version)]
pub struct Args {
    /// Root sitemap URL (index or URL set), e.g. https://example.com/sitemap.xml
    pub sitemap_url: String,

    /// Path to a JSON run configuration
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override the output directory
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Override the delay between pages, in milliseconds
    #[arg(short, long)]
    pub delay_ms: Option<u64>,

    /// Override the minimum console level (SEVERE, WARNING, INFO, ALL)
    #[arg(short, long)]
    pub level: Option<String>,

    /// Exclude console messages containing this substring (repeatable)
    #[arg(short, long = "filter")]
    pub filters: Vec<String>,

    /// Write a log file even for pages without qualifying console records
    #[arg(long)]
    pub create_empty_log_files: bool,

    /// Override the WebDriver URL
    #[arg(long)]
    pub webdriver_url: Option<String>,
}

impl Args {
    /// Apply command-line overrides on top of a loaded configuration
    pub fn apply_overrides(&self, mut config: RunConfiguration) -> RunConfiguration {
        if let Some(dir) = &self.output_dir {
            config.output_directory = dir.clone();
        }
        if let Some(delay) = self.delay_ms {
            config.crawl_delay_ms = delay;
        }
        if let Some(level) = &self.level {
            config.browser_log_level = level.clone();
        }
        config.filter_log_messages.extend(self.filters.iter().cloned());
        if self.create_empty_log_files {
            config.create_empty_log_files = true;
        }
        if let Some(url) = &self.webdriver_url {
            config.webdriver_url = url.clone();
        }
        config
    }
}
