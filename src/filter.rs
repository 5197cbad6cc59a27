use crate::results::{LogRecord, Severity};

/// Configuration for console record filtering
#[derive(Debug, Clone)]
pub struct LogFilterConfig {
    /// Minimum severity a record needs to be kept
    pub threshold: Severity,

    /// Substrings that drop a record regardless of severity (matched case-insensitively)
    pub suppressions: Vec<String>,
}

impl Default for LogFilterConfig {
    fn default() -> Self {
        Self {
            threshold: Severity::Severe,
            suppressions: Vec::new(),
        }
    }
}

/// Reduces raw console records to the ones worth persisting
#[derive(Debug, Clone)]
pub struct LogFilter {
    threshold: Severity,
    lowered_suppressions: Vec<String>,
}

impl Default for LogFilter {
    fn default() -> Self {
        Self::new(LogFilterConfig::default())
    }
}

impl LogFilter {
    /// Create a new log filter from configuration
    pub fn new(config: LogFilterConfig) -> Self {
        let lowered_suppressions = config
            .suppressions
            .iter()
            .map(|s| s.to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            threshold: config.threshold,
            lowered_suppressions,
        }
    }

    pub fn threshold(&self) -> Severity {
        self.threshold
    }

    /// Determine if a single record passes every rule
    pub fn should_keep(&self, record: &LogRecord) -> bool {
        if record.severity < self.threshold {
            return false;
        }

        !self.is_suppressed(&record.message)
    }

    fn is_suppressed(&self, message: &str) -> bool {
        if self.lowered_suppressions.is_empty() {
            return false;
        }
        let lowered = message.to_lowercase();
        self.lowered_suppressions
            .iter()
            .any(|needle| lowered.contains(needle.as_str()))
    }

    /// Keep the passing records, preserving input order
    pub fn apply(&self, records: Vec<LogRecord>) -> Vec<LogRecord> {
        records.into_iter().filter(|r| self.should_keep(r)).collect()
    }
}

/// One-shot convenience over [`LogFilter`]
pub fn filter(records: Vec<LogRecord>, threshold: Severity, suppressions: &[String]) -> Vec<LogRecord> {
    LogFilter::new(LogFilterConfig {
        threshold,
        suppressions: suppressions.to_vec(),
    })
    .apply(records)
}
