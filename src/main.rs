use clap::Parser;
use sitemap_console_audit::{ConsoleAudit, RunConfiguration};
use std::process::ExitCode;

mod args;
use args::Args;

#[tokio::main]
async fn main() -> ExitCode {
    // Parse command-line arguments
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => match RunConfiguration::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::FAILURE;
            }
        },
        None => RunConfiguration::default(),
    };
    let mut config = args.apply_overrides(config);

    // Override the WebDriver URL with an environment variable if provided
    if let Ok(webdriver_url) = std::env::var("WEBDRIVER_URL") {
        if !webdriver_url.is_empty() {
            config.webdriver_url = webdriver_url;
        }
    }

    // Initialize logging; RUST_LOG takes precedence over the configured level
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.script_log_level.as_str()),
    )
    .format_timestamp_secs()
    .init();

    ::log::info!("Starting console audit for sitemap: {}", args.sitemap_url);
    println!("Note: Page crawling requires a WebDriver server (e.g., ChromeDriver).");
    println!(
        "Set WEBDRIVER_URL environment variable if not using the default {}",
        config.webdriver_url
    );

    let start_time = std::time::Instant::now();
    let result = ConsoleAudit::new(args.sitemap_url.as_str())
        .with_config(config)
        .run()
        .await;

    match result {
        Ok(summary) => {
            println!(
                "Run summary: {} attempted, {} succeeded, {} failed ({} records written, {} write errors) in {:.2} seconds",
                summary.total,
                summary.succeeded,
                summary.failed,
                summary.records_written,
                summary.write_errors,
                start_time.elapsed().as_secs_f64()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            ::log::error!("Audit aborted: {}", e);
            println!("Run summary: 0 attempted, 0 succeeded, 0 failed (aborted: {})", e);
            ExitCode::FAILURE
        }
    }
}
