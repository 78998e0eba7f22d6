//! Sitemap-crawler main entry point
//!
//! This is the command-line interface: read a sitemap, crawl it, report.

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use sitemap_crawler::config::{load_config, validate, CrawlConfig, Settings};
use sitemap_crawler::crawler::{Coordinator, Progress, SitemapReader};
use sitemap_crawler::output::{log_progress, print_statistics, write_json_report, JsonReport};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Sitemap-crawler: a bounded, one-hop site health checker
///
/// Fetches every URL listed in a sitemap with a fixed number of concurrent
/// requests, optionally checks the links found on those pages, and reports
/// status codes and latencies. Exits with status 1 if any URL did not
/// return 200.
#[derive(Parser, Debug)]
#[command(name = "sitemap-crawler")]
#[command(version)]
#[command(about = "A bounded, one-hop site health checker", long_about = None)]
struct Cli {
    /// URL of the sitemap (or sitemap index) to crawl
    #[arg(value_name = "SITEMAP_URL")]
    sitemap: String,

    /// Path to TOML configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Maximum number of concurrent requests
    #[arg(short = 'c', long, value_name = "N", allow_negative_numbers = true)]
    concurrency: Option<i64>,

    /// Replace the host of every sitemap URL (e.g. staging.example.com:8080)
    #[arg(long, value_name = "HOST")]
    host: Option<String>,

    /// Per-request timeout in milliseconds
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,

    /// Basic auth user
    #[arg(long)]
    user: Option<String>,

    /// Basic auth password (the user may come from the config file)
    #[arg(long)]
    pass: Option<String>,

    /// Extra request header, formatted as "Key: Value"
    #[arg(long, value_name = "HEADER")]
    header: Option<String>,

    /// User agent sent with every request
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,

    /// Follow links to other hosts
    #[arg(long)]
    crawl_external: bool,

    /// Follow <a href> links
    #[arg(long)]
    crawl_hyperlinks: bool,

    /// Follow <img src> links
    #[arg(long)]
    crawl_images: bool,

    /// Write the statistics as JSON to this file
    #[arg(long, value_name = "PATH")]
    json: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    /// Applies command-line values on top of the configuration file
    fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(concurrency) = self.concurrency {
            settings.crawl.concurrency = concurrency;
        }
        if let Some(host) = &self.host {
            settings.crawl.host = Some(host.clone());
        }
        if let Some(timeout_ms) = self.timeout_ms {
            settings.http.timeout_ms = timeout_ms;
        }
        if let Some(user) = &self.user {
            settings.http.user = Some(user.clone());
        }
        if let Some(pass) = &self.pass {
            settings.http.pass = Some(pass.clone());
        }
        if let Some(header) = &self.header {
            settings.http.header = Some(header.clone());
        }
        if let Some(user_agent) = &self.user_agent {
            settings.http.user_agent = user_agent.clone();
        }

        // Flags only ever switch link following on
        settings.links.follow_external |= self.crawl_external;
        settings.links.follow_hyperlinks |= self.crawl_hyperlinks;
        settings.links.follow_images |= self.crawl_images;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = CrawlConfig::from(load_settings(&cli)?);
    let started_at = Utc::now();

    let reader = SitemapReader::new(&config.fetch)?;
    let seeds: Vec<String> = match reader.read(&cli.sitemap).await {
        Ok(urls) => urls.into_iter().map(String::from).collect(),
        Err(e) => {
            tracing::error!("Failed to read sitemap {}: {}", cli.sitemap, e);
            return Ok(ExitCode::FAILURE);
        }
    };

    let cancel = CancellationToken::new();
    let (progress_tx, progress_rx) = watch::channel(Progress::default());
    watch_interrupts(cancel.clone(), progress_rx);

    let outcome = Coordinator::new(config)
        .with_progress(progress_tx)
        .run(&seeds, cancel)
        .await
        .context("Crawl failed")?;
    let finished_at = Utc::now();

    print_statistics(&outcome.stats);

    if let Some(path) = &cli.json {
        let report = JsonReport {
            sitemap: cli.sitemap.clone(),
            started_at,
            finished_at,
            error: outcome.error.as_ref().map(ToString::to_string),
            stats: outcome.stats.clone(),
        };
        write_json_report(&report, path)
            .with_context(|| format!("Failed to write JSON report to {}", path.display()))?;
        tracing::info!("JSON report written to {}", path.display());
    }

    match &outcome.error {
        None => {
            tracing::info!("All {} URL(s) returned 200", outcome.stats.total);
            Ok(ExitCode::SUCCESS)
        }
        Some(e) => {
            tracing::error!("{}", e);
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sitemap_crawler=info,warn"),
            1 => EnvFilter::new("sitemap_crawler=debug,info"),
            2 => EnvFilter::new("sitemap_crawler=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the configuration file (if any) and applies the CLI overrides
fn load_settings(cli: &Cli) -> anyhow::Result<Settings> {
    let mut settings = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?
        }
        None => Settings::default(),
    };

    cli.apply_overrides(&mut settings);
    validate(&settings).context("Invalid configuration")?;
    Ok(settings)
}

/// Cancels the crawl on Ctrl-C and logs the totals so far
///
/// In-flight requests are still allowed to finish. A second Ctrl-C exits
/// immediately.
fn watch_interrupts(cancel: CancellationToken, progress: watch::Receiver<Progress>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        tracing::warn!("Interrupted, waiting for in-flight requests (Ctrl-C again to quit)");
        log_progress(&progress.borrow());
        cancel.cancel();

        if tokio::signal::ctrl_c().await.is_ok() {
            log_progress(&progress.borrow());
            std::process::exit(130);
        }
    });
}
