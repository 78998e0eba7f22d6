//! Crawl statistics
//!
//! Per-phase accumulation of fetch results and the merge used to combine
//! phases into the final report.

mod aggregator;
mod types;

pub use aggregator::{average_latency, merge, PhaseStats, StatsAccumulator};
pub use types::{CrawlReport, CrawlStats, StatsSnapshot};
