//! Second-hop frontier
//!
//! The frontier is built once from the seed phase: every followed link that
//! does not point at an already fetched URL, together with the pages that
//! linked to it.

use crate::config::LinkPolicy;
use crate::crawler::fetcher::FetchResult;
use crate::crawler::parser::{Link, LinkKind};
use crate::stats::CrawlReport;
use std::collections::{HashMap, HashSet};

/// URLs to fetch in the second phase
#[derive(Debug, Clone, Default)]
pub struct Frontier {
    urls: Vec<String>,
    sources: HashMap<String, Vec<String>>,
}

impl Frontier {
    /// Frontier URLs in first-discovery order
    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Pages linking to `url`, in the order they were seen
    pub fn linking_urls(&self, url: &str) -> &[String] {
        self.sources.get(url).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Fills in the linking URLs of second-hop reports
    pub fn annotate(&self, reports: &mut [CrawlReport]) {
        for report in reports {
            report.linking_urls = self.linking_urls(&report.url).to_vec();
        }
    }
}

/// Returns true if the policy allows following `link`
pub fn is_followed(policy: &LinkPolicy, link: &Link) -> bool {
    if link.is_external && !policy.follow_external {
        return false;
    }
    match link.kind {
        LinkKind::Hyperlink => policy.follow_hyperlinks,
        LinkKind::Image => policy.follow_images,
    }
}

/// Builds the frontier from the results of the seed phase
///
/// Pages are visited in `seed_order` and links in page order, which makes
/// the frontier deterministic no matter in which order fetches completed.
/// Any URL that is a key of `results` is never part of the frontier.
pub fn derive_frontier(
    seed_order: &[String],
    results: &HashMap<String, FetchResult>,
    policy: &LinkPolicy,
) -> Frontier {
    let mut frontier = Frontier::default();
    let mut visited = HashSet::new();

    for seed in seed_order {
        if !visited.insert(seed.as_str()) {
            continue;
        }
        let Some(result) = results.get(seed) else {
            continue;
        };

        for link in result.links.iter().filter(|l| is_followed(policy, l)) {
            let target = link.target_url.to_string();
            if results.contains_key(&target) {
                continue;
            }

            let urls = &mut frontier.urls;
            let sources = frontier.sources.entry(target.clone()).or_insert_with(|| {
                urls.push(target);
                Vec::new()
            });
            if !sources.contains(&result.url) {
                sources.push(result.url.clone());
            }
        }
    }

    frontier
}
