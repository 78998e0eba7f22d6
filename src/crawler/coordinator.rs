//! Crawler coordinator - two-phase crawl orchestration
//!
//! A crawl runs at most two sequential phases over the worker pool:
//! - Phase 1 fetches the seed URLs, extracting links if any link type is followed
//! - Phase 2 fetches the frontier of newly discovered URLs, never extracting
//!   links, which bounds the crawl to one hop
//!
//! Both phases are folded into their own statistics and merged at the end.

use crate::config::{CrawlConfig, FetchConfig};
use crate::crawler::fetcher::{FetchResult, HttpFetcher, HttpGetter};
use crate::crawler::frontier::{derive_frontier, Frontier};
use crate::crawler::pool::WorkerPool;
use crate::stats::{
    average_latency, merge, CrawlStats, PhaseStats, StatsAccumulator, StatsSnapshot,
};
use crate::url::{parse_host_override, rewrite_urls_host};
use crate::{ConfigError, CrawlerError};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Crawl-level outcome signals
///
/// Neither is a failure of the crawl itself: the statistics are complete
/// either way and the caller decides how severe they are.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OutcomeError {
    #[error("no URL was crawled")]
    NothingCrawled,

    #[error("{non_200} of {total} URL(s) did not return 200")]
    Degraded { non_200: usize, total: usize },
}

/// Final statistics of a crawl and how it is classified
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub stats: CrawlStats,
    pub error: Option<OutcomeError>,
}

impl CrawlOutcome {
    fn new(stats: CrawlStats) -> Self {
        let error = classify(&stats);
        Self { stats, error }
    }

    pub fn is_healthy(&self) -> bool {
        self.error.is_none()
    }
}

/// Classifies merged statistics
pub fn classify(stats: &CrawlStats) -> Option<OutcomeError> {
    if stats.total == 0 {
        Some(OutcomeError::NothingCrawled)
    } else if stats.total != stats.count_200() {
        Some(OutcomeError::Degraded {
            non_200: stats.total - stats.count_200(),
            total: stats.total,
        })
    } else {
        None
    }
}

/// Which part of the crawl is running
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Seeds,
    Links,
    Done,
}

/// Running totals over both phases, published while a crawl runs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Progress {
    pub phase: Phase,
    pub stats: StatsSnapshot,
}

impl Progress {
    /// Totals of the finished phases plus a snapshot of the running one
    fn new(phase: Phase, done: &StatsSnapshot, current: &StatsAccumulator) -> Self {
        Self {
            phase,
            stats: done.merged(&current.snapshot()),
        }
    }
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: CrawlConfig,
    pool: WorkerPool,
    progress: Option<watch::Sender<Progress>>,
}

impl Coordinator {
    /// Creates a coordinator fetching over HTTP
    pub fn new(config: CrawlConfig) -> Self {
        Self::with_getter(config, Arc::new(HttpFetcher::default()))
    }

    /// Creates a coordinator with a custom [`HttpGetter`]
    pub fn with_getter(config: CrawlConfig, getter: Arc<dyn HttpGetter>) -> Self {
        Self {
            config,
            pool: WorkerPool::new(getter),
            progress: None,
        }
    }

    /// Publishes running totals on `tx` after every fetch
    pub fn with_progress(mut self, tx: watch::Sender<Progress>) -> Self {
        self.progress = Some(tx);
        self
    }

    /// Runs the crawl over `seeds`
    ///
    /// Cancellation stops dispatching new fetches in whichever phase is
    /// running; fetches already started complete and are counted, and the
    /// link phase still runs over the frontier found so far.
    ///
    /// # Errors
    ///
    /// Only mechanism failures are errors: an unusable host override or
    /// HTTP clients that cannot be built. Crawl outcomes are reported in
    /// [`CrawlOutcome::error`].
    pub async fn run(
        &self,
        seeds: &[String],
        cancel: CancellationToken,
    ) -> Result<CrawlOutcome, CrawlerError> {
        let start_time = Instant::now();
        let limit = self.concurrency_limit();
        let seeds = self.prepare_seeds(seeds)?;
        let follow_links = self.config.link_policy.any_enabled();

        tracing::info!(
            "Crawling {} seed URL(s) with {} concurrent request(s)",
            seeds.len(),
            limit
        );

        let seed_config = FetchConfig {
            parse_links: follow_links,
            ..self.config.fetch.clone()
        };
        let (seed_phase, results) = self
            .run_phase(
                Phase::Seeds,
                seeds.clone(),
                seed_config,
                limit,
                &cancel,
                &StatsSnapshot::default(),
                follow_links,
            )
            .await?;
        log_phase("Seed", &seed_phase.stats);

        let stats = if follow_links {
            let frontier = derive_frontier(&seeds, &results, &self.config.link_policy);
            drop(results);
            tracing::info!("Frontier: {} new URL(s) to check", frontier.len());

            let link_phase = self
                .crawl_frontier(&frontier, limit, &cancel, &seed_phase.stats)
                .await?;
            log_phase("Link", &link_phase.stats);

            let mut merged = merge(&seed_phase.stats, &link_phase.stats);
            merged.average_200_latency = average_latency(
                seed_phase.sum_200 + link_phase.sum_200,
                merged.count_200(),
            );
            merged
        } else {
            seed_phase.stats
        };

        self.publish(Progress {
            phase: Phase::Done,
            stats: StatsSnapshot::from(&stats),
        });

        tracing::info!(
            "Crawl completed: {} URL(s) in {:?}",
            stats.total,
            start_time.elapsed()
        );

        Ok(CrawlOutcome::new(stats))
    }

    /// Fetches the frontier without extracting links and annotates the
    /// resulting reports with the pages that linked to them
    async fn crawl_frontier(
        &self,
        frontier: &Frontier,
        limit: usize,
        cancel: &CancellationToken,
        seed_stats: &CrawlStats,
    ) -> Result<PhaseStats, CrawlerError> {
        if frontier.is_empty() {
            return Ok(PhaseStats::default());
        }

        let link_config = FetchConfig {
            parse_links: false,
            ..self.config.fetch.clone()
        };
        let (mut phase, _) = self
            .run_phase(
                Phase::Links,
                frontier.urls().to_vec(),
                link_config,
                limit,
                cancel,
                &StatsSnapshot::from(seed_stats),
                false,
            )
            .await?;

        frontier.annotate(&mut phase.stats.non_200);
        Ok(phase)
    }

    /// Runs one pass of the worker pool and folds its results
    #[allow(clippy::too_many_arguments)]
    async fn run_phase(
        &self,
        phase: Phase,
        urls: Vec<String>,
        fetch: FetchConfig,
        limit: usize,
        cancel: &CancellationToken,
        done: &StatsSnapshot,
        keep_results: bool,
    ) -> Result<(PhaseStats, HashMap<String, FetchResult>), CrawlerError> {
        let mut rx = self
            .pool
            .run(urls, Arc::new(fetch), limit, cancel.clone())?;

        let mut accumulator = StatsAccumulator::new();
        let mut results = HashMap::new();

        while let Some(result) = rx.recv().await {
            accumulator.record(&result);
            self.publish(Progress::new(phase, done, &accumulator));
            if keep_results {
                results.insert(result.url.clone(), result);
            }
        }

        Ok((accumulator.finish(), results))
    }

    /// The configured concurrency, coerced to at least 1
    fn concurrency_limit(&self) -> usize {
        if self.config.concurrency_limit <= 0 {
            tracing::warn!(
                "Concurrency limit {} is not positive, using 1",
                self.config.concurrency_limit
            );
        }
        self.config.effective_concurrency()
    }

    /// Applies the host override and canonicalizes seed URLs
    ///
    /// Canonical seeds compare equal to the links extracted from pages, so
    /// a link back to a seed is recognized as already fetched. Seeds that
    /// do not parse are kept as given and fail at fetch time.
    fn prepare_seeds(&self, seeds: &[String]) -> Result<Vec<String>, CrawlerError> {
        let seeds = match self.config.host_override.as_deref().filter(|h| !h.is_empty()) {
            Some(raw) => {
                let host = parse_host_override(raw)
                    .map_err(|e| ConfigError::InvalidHost(format!("{}: {}", raw, e)))?;
                tracing::info!("Overriding seed host with {}", raw);
                rewrite_urls_host(seeds, &host)
            }
            None => seeds.to_vec(),
        };

        Ok(seeds
            .into_iter()
            .map(|seed| Url::parse(&seed).map(String::from).unwrap_or(seed))
            .collect())
    }

    fn publish(&self, progress: Progress) {
        if let Some(tx) = &self.progress {
            tx.send_replace(progress);
        }
    }
}

fn log_phase(name: &str, stats: &CrawlStats) {
    tracing::info!(
        "{} phase finished: {} URL(s), {} with status 200, {} other",
        name,
        stats.total,
        stats.count_200(),
        stats.non_200.len()
    );
}
