use crate::error::NavigationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Console message importance, ordered from least to most restrictive
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Severe,
}

impl Severity {
    /// Canonical upper-case name, also the level name the browser log preference expects
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Severe => "SEVERE",
        }
    }

    /// Maps a level reported by the rendering engine into the canonical scale.
    ///
    /// Chrome reports `SEVERE`, `WARNING`, `INFO`, `DEBUG` and occasionally the
    /// java.util.logging fine levels; anything unknown is treated as `Debug`.
    pub fn from_engine_level(level: &str) -> Self {
        level.parse().unwrap_or(Severity::Debug)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SEVERE" | "ERROR" => Ok(Severity::Severe),
            "WARNING" | "WARN" => Ok(Severity::Warning),
            "INFO" | "LOG" => Ok(Severity::Info),
            "DEBUG" | "FINE" | "FINER" | "FINEST" | "VERBOSE" | "ALL" => Ok(Severity::Debug),
            other => Err(format!("unknown severity level '{}'", other)),
        }
    }
}

/// One console event observed while a page was loaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub severity: Severity,
    pub message: String,
    /// The page that produced the record
    pub source_url: String,
}

impl LogRecord {
    pub fn new(severity: Severity, message: impl Into<String>, source_url: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            source_url: source_url.into(),
        }
    }
}

/// Result of a single page attempt
#[derive(Debug, Clone)]
pub enum CrawlStatus {
    Success(Vec<LogRecord>),
    Failure(NavigationError),
}

/// Per-URL outcome handed from the crawl loop to the output writer
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub url: String,
    pub status: CrawlStatus,
}

impl CrawlOutcome {
    pub fn new(url: impl Into<String>, result: Result<Vec<LogRecord>, NavigationError>) -> Self {
        let status = match result {
            Ok(records) => CrawlStatus::Success(records),
            Err(e) => CrawlStatus::Failure(e),
        };
        Self {
            url: url.into(),
            status,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, CrawlStatus::Success(_))
    }
}

/// Aggregated counters reported at the end of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub records_written: usize,
    pub write_errors: usize,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} attempted, {} succeeded, {} failed, {} records written, {} write errors",
            self.total, self.succeeded, self.failed, self.records_written, self.write_errors
        )
    }
}
