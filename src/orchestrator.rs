use crate::browser::PageLoader;
use crate::config::RunConfiguration;
use crate::error::AuditError;
use crate::filter::{LogFilter, LogFilterConfig};
use crate::output::{OutputWriter, WriteResult};
use crate::results::{CrawlOutcome, CrawlStatus, RunSummary};
use crate::sitemap::ResolvedUrlSet;

/// Crawl every resolved URL with `loader`, strictly one at a time in resolution order.
///
/// The loader is closed before returning, whether the run completes or the
/// output directory cannot be created. Per-page failures only show up in the
/// returned summary.
pub async fn run<L: PageLoader + ?Sized>(
    urls: &ResolvedUrlSet,
    loader: &mut L,
    config: &RunConfiguration,
) -> Result<RunSummary, AuditError> {
    let result = crawl(urls, loader, config).await;
    loader.close().await;

    if let Ok(summary) = &result {
        ::log::info!("Crawling process finished: {}", summary);
    }
    result
}

async fn crawl<L: PageLoader + ?Sized>(
    urls: &ResolvedUrlSet,
    loader: &mut L,
    config: &RunConfiguration,
) -> Result<RunSummary, AuditError> {
    let writer = OutputWriter::new(&config.output_directory, config.create_empty_log_files)?;
    let log_filter = LogFilter::new(LogFilterConfig {
        threshold: config.severity_threshold()?,
        suppressions: config.filter_log_messages.clone(),
    });
    let run_timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let delay = config.crawl_delay();

    let mut summary = RunSummary::default();
    let total = urls.len();
    ::log::info!("Starting crawl of {} URLs...", total);

    for (i, url) in urls.iter().enumerate() {
        if i > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        ::log::info!("Crawling URL {}/{}: {}", i + 1, total, url);
        summary.total += 1;

        let outcome = CrawlOutcome::new(url.as_str(), loader.capture(url.as_str()).await);
        record_outcome(outcome, &log_filter, &writer, config, &run_timestamp, &mut summary);
    }

    Ok(summary)
}

/// Filter and persist one page result, updating the counters
fn record_outcome(
    outcome: CrawlOutcome,
    log_filter: &LogFilter,
    writer: &OutputWriter,
    config: &RunConfiguration,
    timestamp: &str,
    summary: &mut RunSummary,
) {
    match outcome.status {
        CrawlStatus::Success(records) => {
            summary.succeeded += 1;
            let kept = log_filter.apply(records);
            if !kept.is_empty() {
                ::log::warn!(
                    "Found {} {} console record(s) on: {}",
                    kept.len(),
                    log_filter.threshold(),
                    outcome.url
                );
            }

            match writer.write(&outcome.url, &kept, timestamp) {
                Ok(WriteResult::Written { entries, .. }) => summary.records_written += entries,
                Ok(_) => {}
                Err(e) => {
                    ::log::error!("{}", e);
                    summary.write_errors += 1;
                }
            }
        }
        CrawlStatus::Failure(error) => {
            summary.failed += 1;
            ::log::error!("Error navigating to or processing {}: {}", outcome.url, error);

            if config.write_failure_logs {
                if let Err(e) = writer.write_failure(&outcome.url, &error, timestamp) {
                    ::log::error!("{}", e);
                    summary.write_errors += 1;
                }
            }
        }
    }
}
