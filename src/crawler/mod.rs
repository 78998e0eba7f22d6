//! Crawler module for fetching and checking pages
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with timing and link extraction
//! - The bounded worker pool with cooperative cancellation
//! - Frontier derivation for the second hop
//! - Overall two-phase crawl coordination
//! - Reading seed URLs from sitemaps

mod coordinator;
mod fetcher;
mod frontier;
mod parser;
mod pool;
mod sitemap;

#[cfg(test)]
pub(crate) mod testing;

pub use coordinator::{classify, Coordinator, CrawlOutcome, OutcomeError, Phase, Progress};
pub use fetcher::{
    build_http_client, parse_custom_header, FetchError, FetchResult, FetchTiming, HttpFetcher,
    HttpGetter,
};
pub use frontier::{derive_frontier, is_followed, Frontier};
pub use parser::{extract_links, HtmlLinkExtractor, Link, LinkExtractor, LinkKind};
pub use pool::{ClientPool, PooledClient, WorkerPool};
pub use sitemap::{parse_sitemap, SitemapDocument, SitemapKind, SitemapReader};

use crate::config::CrawlConfig;
use crate::CrawlerError;
use tokio_util::sync::CancellationToken;

/// Runs a complete crawl over `seeds`
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Coerce the concurrency limit and apply the host override
/// 2. Fetch every seed URL
/// 3. If any link type is followed, fetch the newly discovered links once
/// 4. Merge the statistics of both phases and classify the result
///
/// # Returns
///
/// * `Ok(CrawlOutcome)` - The statistics, with `error` set if nothing was
///   crawled or some URL did not answer 200
/// * `Err(CrawlerError)` - The crawl could not run
///
/// # Example
///
/// ```no_run
/// use sitemap_crawler::{crawl, CrawlConfig};
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let seeds = vec!["https://example.com/".to_string()];
/// let outcome = crawl(&seeds, CrawlConfig::default(), CancellationToken::new()).await?;
/// println!("{} URL(s), healthy: {}", outcome.stats.total, outcome.is_healthy());
/// # Ok(())
/// # }
/// ```
pub async fn crawl(
    seeds: &[String],
    config: CrawlConfig,
    cancel: CancellationToken,
) -> Result<CrawlOutcome, CrawlerError> {
    Coordinator::new(config).run(seeds, cancel).await
}
