//! Folding fetch results into statistics, and merging statistics
//!
//! A [`StatsAccumulator`] is fed the results of one phase in whatever order
//! they complete. [`merge`] combines two finished statistics sets; it is
//! associative and commutative, with [`CrawlStats::default`] as identity.

use crate::crawler::FetchResult;
use crate::stats::types::{CrawlReport, CrawlStats, StatsSnapshot};
use std::time::Duration;

/// Running totals of a single crawl phase
///
/// `CrawlStats` only stores the average 200 latency, so the accumulator
/// keeps the latency sum next to it until the phase is finished.
#[derive(Debug, Clone, Default)]
pub struct StatsAccumulator {
    stats: CrawlStats,
    sum_200: Duration,
}

/// Statistics of a finished phase, with the latency sum they were built from
#[derive(Debug, Clone, Default)]
pub struct PhaseStats {
    pub stats: CrawlStats,
    pub sum_200: Duration,
}

impl StatsAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one fetch result to the totals
    pub fn record(&mut self, result: &FetchResult) {
        let stats = &mut self.stats;
        stats.total += 1;
        *stats.status_codes.entry(result.status_code).or_insert(0) += 1;

        if result.status_code == 200 {
            self.sum_200 += result.latency;
            if result.latency > stats.max_200_latency {
                stats.max_200_latency = result.latency;
            }
        } else {
            stats.non_200.push(CrawlReport {
                url: result.url.clone(),
                status_code: result.status_code,
                latency: result.latency,
                server_time: result.timing.server,
                linking_urls: Vec::new(),
            });
        }
    }

    /// Current totals, with the 200 average filled in
    ///
    /// Leaves the accumulator untouched; non-200 reports are not copied.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            total: self.stats.total,
            status_codes: self.stats.status_codes.clone(),
            average_200_latency: average_latency(self.sum_200, self.stats.count_200()),
            max_200_latency: self.stats.max_200_latency,
        }
    }

    /// Ends the phase
    pub fn finish(self) -> PhaseStats {
        let mut stats = self.stats;
        stats.average_200_latency = average_latency(self.sum_200, stats.count_200());
        PhaseStats {
            stats,
            sum_200: self.sum_200,
        }
    }
}

/// Mean of `count` latencies summing to `sum`; zero when `count` is zero
pub fn average_latency(sum: Duration, count: usize) -> Duration {
    if count == 0 {
        return Duration::ZERO;
    }
    duration_from_nanos(sum.as_nanos() / count as u128)
}

/// Merges two statistics sets into a new one
///
/// The 200 average is re-weighted by each side's number of 200 responses:
/// `(a.avg * a200 + b.avg * b200) / (a200 + b200)`, or zero if neither side
/// saw a 200.
///
/// # Example
///
/// ```
/// use sitemap_crawler::stats::{merge, CrawlStats};
/// use std::time::Duration;
///
/// let mut a = CrawlStats::default();
/// a.total = 1;
/// a.status_codes.insert(200, 1);
/// a.average_200_latency = Duration::from_millis(10);
/// a.max_200_latency = Duration::from_millis(10);
///
/// let mut b = CrawlStats::default();
/// b.total = 3;
/// b.status_codes.insert(200, 3);
/// b.average_200_latency = Duration::from_millis(30);
/// b.max_200_latency = Duration::from_millis(50);
///
/// let merged = merge(&a, &b);
/// assert_eq!(merged.total, 4);
/// assert_eq!(merged.average_200_latency, Duration::from_nanos(25_000_000));
/// assert_eq!(merged.max_200_latency, Duration::from_millis(50));
/// ```
pub fn merge(a: &CrawlStats, b: &CrawlStats) -> CrawlStats {
    let mut status_codes = a.status_codes.clone();
    for (status, count) in &b.status_codes {
        *status_codes.entry(*status).or_insert(0) += count;
    }

    let mut non_200 = Vec::with_capacity(a.non_200.len() + b.non_200.len());
    non_200.extend(a.non_200.iter().cloned());
    non_200.extend(b.non_200.iter().cloned());

    CrawlStats {
        total: a.total + b.total,
        status_codes,
        average_200_latency: weighted_average(
            a.average_200_latency,
            a.count_200(),
            b.average_200_latency,
            b.count_200(),
        ),
        max_200_latency: a.max_200_latency.max(b.max_200_latency),
        non_200,
    }
}

impl StatsSnapshot {
    /// Combines two sets of totals the same way [`merge`] does
    pub fn merged(&self, other: &StatsSnapshot) -> StatsSnapshot {
        let mut status_codes = self.status_codes.clone();
        for (status, count) in &other.status_codes {
            *status_codes.entry(*status).or_insert(0) += count;
        }

        StatsSnapshot {
            total: self.total + other.total,
            status_codes,
            average_200_latency: weighted_average(
                self.average_200_latency,
                self.count_200(),
                other.average_200_latency,
                other.count_200(),
            ),
            max_200_latency: self.max_200_latency.max(other.max_200_latency),
        }
    }
}

fn weighted_average(a_avg: Duration, a_count: usize, b_avg: Duration, b_count: usize) -> Duration {
    let count = a_count as u128 + b_count as u128;
    if count == 0 {
        return Duration::ZERO;
    }
    let weighted = a_avg.as_nanos() * a_count as u128 + b_avg.as_nanos() * b_count as u128;
    duration_from_nanos(weighted / count)
}

fn duration_from_nanos(nanos: u128) -> Duration {
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}
