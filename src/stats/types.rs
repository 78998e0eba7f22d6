use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::time::Duration;

/// Summary record of a URL that did not answer with HTTP 200
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct CrawlReport {
    pub url: String,

    /// HTTP status, or 0 when no response was received
    pub status_code: u16,

    /// Total elapsed time of the request, body included
    #[serde(serialize_with = "as_millis")]
    pub latency: Duration,

    /// Time until the response headers arrived
    #[serde(serialize_with = "as_millis")]
    pub server_time: Duration,

    /// Pages that linked to this URL; only filled in for second-hop URLs
    pub linking_urls: Vec<String>,
}

/// Status and latency statistics of one or more crawl phases
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct CrawlStats {
    /// Number of URLs fetched
    pub total: usize,

    /// Number of responses per status code (0 = transport failure)
    pub status_codes: BTreeMap<u16, usize>,

    #[serde(serialize_with = "as_millis")]
    pub average_200_latency: Duration,

    #[serde(serialize_with = "as_millis")]
    pub max_200_latency: Duration,

    pub non_200: Vec<CrawlReport>,
}

impl CrawlStats {
    /// Number of responses with the given status code
    pub fn count(&self, status: u16) -> usize {
        self.status_codes.get(&status).copied().unwrap_or(0)
    }

    /// Number of HTTP 200 responses
    pub fn count_200(&self) -> usize {
        self.count(200)
    }

    /// Returns true if at least one URL was fetched and all of them answered 200
    pub fn is_healthy(&self) -> bool {
        self.total > 0 && self.total == self.count_200()
    }
}

/// Running totals without the per-URL reports
///
/// Cheap to build after every fetch, which is how crawl progress is
/// published.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub total: usize,
    pub status_codes: BTreeMap<u16, usize>,
    pub average_200_latency: Duration,
    pub max_200_latency: Duration,
}

impl StatsSnapshot {
    pub fn count_200(&self) -> usize {
        self.status_codes.get(&200).copied().unwrap_or(0)
    }
}

impl From<&CrawlStats> for StatsSnapshot {
    fn from(stats: &CrawlStats) -> Self {
        Self {
            total: stats.total,
            status_codes: stats.status_codes.clone(),
            average_200_latency: stats.average_200_latency,
            max_200_latency: stats.max_200_latency,
        }
    }
}

fn as_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}
