use crate::error::{NavigationError, WriteError};
use crate::results::LogRecord;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use url::Url;

const MAX_STEM_LEN: usize = 200;

static UNSAFE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9._-]+").expect("filename pattern should be valid"));

/// What the writer did for one URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteResult {
    /// Records were appended to the file
    Written { path: PathBuf, entries: usize },
    /// No records; a sentinel line was appended
    Sentinel { path: PathBuf },
    /// No records and empty files are disabled; nothing touched
    Skipped,
}

impl WriteResult {
    pub fn entries(&self) -> usize {
        match self {
            WriteResult::Written { entries, .. } => *entries,
            _ => 0,
        }
    }
}

/// Derive the log file name for a URL.
///
/// Scheme is dropped, host, path and query are flattened into `[A-Za-z0-9._-]`
/// with runs of anything else collapsed to `_`. A short digest of the full URL
/// is appended so URLs that flatten to the same stem still get distinct files.
pub fn log_file_name(url: &str) -> String {
    let stem_source = match Url::parse(url) {
        Ok(parsed) => {
            let mut s = String::new();
            if let Some(host) = parsed.host_str() {
                s.push_str(host);
            }
            if let Some(port) = parsed.port() {
                s.push('_');
                s.push_str(&port.to_string());
            }
            let path = parsed.path();
            s.push_str(path.strip_suffix('/').unwrap_or(path));
            if let Some(query) = parsed.query() {
                s.push('_');
                s.push_str(query);
            }
            s
        }
        Err(_) => url.to_string(),
    };

    let mut stem = UNSAFE_CHARS
        .replace_all(&stem_source, "_")
        .trim_matches('_')
        .to_string();
    if stem.is_empty() {
        stem = "index".to_string();
    }
    if stem.len() > MAX_STEM_LEN {
        // Only ASCII survives the sanitiser, so byte truncation is safe
        stem.truncate(MAX_STEM_LEN);
    }

    let digest = Sha256::digest(url.as_bytes());
    format!("{}_{}.log", stem, &hex::encode(digest)[..8])
}

/// Appends per-page results to files under the output directory
#[derive(Debug, Clone)]
pub struct OutputWriter {
    directory: PathBuf,
    create_empty_log_files: bool,
}

impl OutputWriter {
    /// Create the writer, creating the output directory if it is missing.
    ///
    /// Failure here is fatal for a run.
    pub fn new(directory: impl Into<PathBuf>, create_empty_log_files: bool) -> Result<Self, WriteError> {
        let directory = directory.into();
        // create_dir_all is a no-op for an existing directory and tolerates concurrent creation
        fs::create_dir_all(&directory).map_err(|source| WriteError::CreateDir {
            path: directory.clone(),
            source,
        })?;
        ::log::info!("Saving console logs to directory: '{}'", directory.display());

        Ok(Self {
            directory,
            create_empty_log_files,
        })
    }

    /// Full path of the log file for a URL
    pub fn path_for(&self, url: &str) -> PathBuf {
        self.directory.join(log_file_name(url))
    }

    /// Append filtered records for a URL, or a sentinel line when there are none
    pub fn write(&self, url: &str, records: &[LogRecord], timestamp: &str) -> Result<WriteResult, WriteError> {
        if records.is_empty() {
            if !self.create_empty_log_files {
                return Ok(WriteResult::Skipped);
            }
            let path = self.path_for(url);
            self.append(&path, |out| {
                writeln!(out, "[{}] No relevant console records found on: {}", timestamp, url)
            })?;
            return Ok(WriteResult::Sentinel { path });
        }

        let path = self.path_for(url);
        self.append(&path, |out| {
            writeln!(out, "Console records found on: {}", url)?;
            writeln!(out, "{}", "=".repeat(30))?;
            for record in records {
                let message = record.message.trim_end();
                writeln!(out, "[{}] {} - {}", timestamp, record.severity, message)?;
                writeln!(out)?;
            }
            Ok(())
        })?;

        Ok(WriteResult::Written {
            path,
            entries: records.len(),
        })
    }

    /// Append a failure entry for a URL that could not be crawled
    pub fn write_failure(&self, url: &str, error: &NavigationError, timestamp: &str) -> Result<PathBuf, WriteError> {
        let path = self.path_for(url);
        self.append(&path, |out| {
            writeln!(out, "[{}] Failed to crawl or retrieve logs for URL: {}", timestamp, url)?;
            writeln!(out, "Error Type: {}", error.kind())?;
            writeln!(out, "Error Message: {}", error)
        })?;
        Ok(path)
    }

    fn append<F>(&self, path: &Path, body: F) -> Result<(), WriteError>
    where
        F: FnOnce(&mut BufWriter<fs::File>) -> std::io::Result<()>,
    {
        let io_err = |source: std::io::Error| WriteError::Io {
            path: path.to_path_buf(),
            source,
        };
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(io_err)?;
        let mut out = BufWriter::new(file);
        body(&mut out).map_err(io_err)?;
        out.flush().map_err(io_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::Severity;

    const TS: &str = "2024-07-22 10:00:00";

    #[test]
    fn test_file_name_is_flattened() {
        let name = log_file_name("https://example.com/blog/post-1/");
        assert!(name.starts_with("example.com_blog_post-1_"));
        assert!(name.ends_with(".log"));
        assert_eq!(name.len(), "example.com_blog_post-1_".len() + 8 + ".log".len());
    }

    #[test]
    fn test_file_name_is_deterministic() {
        assert_eq!(
            log_file_name("https://example.com/a?b=c"),
            log_file_name("https://example.com/a?b=c")
        );
    }

    #[test]
    fn test_structural_collisions_are_disambiguated() {
        // Both flatten to example.com_a_b
        let a = log_file_name("https://example.com/a/b");
        let b = log_file_name("https://example.com/a_b");
        assert_ne!(a, b);
    }

    #[test]
    fn test_root_url_and_long_paths() {
        assert!(log_file_name("https://example.com/").starts_with("example.com_"));

        let long = format!("https://example.com/{}", "x".repeat(500));
        let name = log_file_name(&long);
        assert_eq!(name.len(), MAX_STEM_LEN + 1 + 8 + ".log".len());
    }

    #[test]
    fn test_empty_records_skipped_without_sentinel_policy() {
        let dir = tempfile::tempdir().unwrap();
        let writer = OutputWriter::new(dir.path(), false).unwrap();

        let result = writer.write("https://example.com/", &[], TS).unwrap();
        assert_eq!(result, WriteResult::Skipped);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_empty_records_write_sentinel() {
        let dir = tempfile::tempdir().unwrap();
        let writer = OutputWriter::new(dir.path(), true).unwrap();

        let result = writer.write("https://example.com/", &[], TS).unwrap();
        let WriteResult::Sentinel { path } = result else {
            panic!("expected sentinel, got {:?}", result);
        };
        let contents = fs::read_to_string(path).unwrap();
        assert_eq!(contents.matches("No relevant console records").count(), 1);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_records_are_appended() {
        let dir = tempfile::tempdir().unwrap();
        let writer = OutputWriter::new(dir.path().join("nested/out"), false).unwrap();
        let url = "https://example.com/page";
        let records = vec![
            LogRecord::new(Severity::Severe, "Uncaught ReferenceError: foo", url),
            LogRecord::new(Severity::Severe, "Failed to load resource", url),
        ];

        assert_eq!(writer.write(url, &records, TS).unwrap().entries(), 2);
        writer.write(url, &records[..1], TS).unwrap();

        let contents = fs::read_to_string(writer.path_for(url)).unwrap();
        assert_eq!(contents.matches("Console records found on").count(), 2);
        assert_eq!(contents.matches("Uncaught ReferenceError").count(), 2);
        assert!(contents.contains("[2024-07-22 10:00:00] SEVERE - Failed to load resource"));
    }

    #[test]
    fn test_failure_entry() {
        let dir = tempfile::tempdir().unwrap();
        let writer = OutputWriter::new(dir.path(), false).unwrap();
        let error = NavigationError::Timeout("page load exceeded 60s".to_string());

        let path = writer.write_failure("https://example.com/slow", &error, TS).unwrap();
        let contents = fs::read_to_string(path).unwrap();
        assert!(contents.contains("Error Type: Timeout"));
        assert!(contents.contains("page load exceeded 60s"));
    }

    #[test]
    fn test_output_directory_creation_failure() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "not a directory").unwrap();

        let result = OutputWriter::new(blocker.join("out"), false);
        assert!(matches!(result, Err(WriteError::CreateDir { .. })));
    }
}
