//! In-memory [`HttpGetter`] for unit tests

use crate::config::FetchConfig;
use crate::crawler::fetcher::{FetchError, FetchResult, HttpGetter};
use crate::crawler::parser::{Link, LinkKind};
use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

#[derive(Debug, Clone)]
struct Script {
    status: u16,
    latency: Duration,
    links: Vec<Link>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            status: 200,
            latency: Duration::ZERO,
            links: Vec::new(),
        }
    }
}

/// Answers every URL from a script instead of the network
///
/// Unscripted URLs answer 200 with zero latency. Status 0 is reported as a
/// connection failure. Links are only returned when the request asked for
/// link extraction.
#[derive(Default)]
pub struct ScriptedGetter {
    scripts: HashMap<String, Script>,
    delay: Duration,
    cancel_on: Option<(usize, CancellationToken)>,
    calls: Mutex<Vec<(String, bool)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedGetter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the status and reported latency of a URL
    pub fn respond(mut self, url: &str, status: u16, latency_ms: u64) -> Self {
        let script = self.scripts.entry(url.to_string()).or_default();
        script.status = status;
        script.latency = Duration::from_millis(latency_ms);
        self
    }

    /// Scripts the links found on a URL
    pub fn links(mut self, url: &str, links: Vec<Link>) -> Self {
        self.scripts.entry(url.to_string()).or_default().links = links;
        self
    }

    /// Real time every call takes, so calls overlap
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Cancels `token` when the `n`th call starts
    pub fn cancel_on_call(mut self, n: usize, token: CancellationToken) -> Self {
        self.cancel_on = Some((n, token));
        self
    }

    /// URLs requested so far, in call order
    pub fn calls(&self) -> Vec<String> {
        self.lock_calls().iter().map(|(url, _)| url.clone()).collect()
    }

    /// Whether link extraction was requested, per call
    pub fn parse_flags(&self) -> Vec<bool> {
        self.lock_calls().iter().map(|(_, parse)| *parse).collect()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn lock_calls(&self) -> std::sync::MutexGuard<'_, Vec<(String, bool)>> {
        self.calls.lock().unwrap()
    }
}

#[async_trait]
impl HttpGetter for ScriptedGetter {
    async fn get(&self, _client: &Client, url: &str, config: &FetchConfig) -> FetchResult {
        let call = {
            let mut calls = self.lock_calls();
            calls.push((url.to_string(), config.parse_links));
            calls.len()
        };
        if let Some((n, token)) = &self.cancel_on {
            if call == *n {
                token.cancel();
            }
        }

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let script = self.scripts.get(url).cloned().unwrap_or_default();
        if script.status == 0 {
            return FetchResult::failed(
                url,
                script.latency,
                FetchError::Connect("connection refused".to_string()),
            );
        }

        let result = FetchResult::new(url, script.status, script.latency);
        if config.parse_links {
            result.with_links(script.links)
        } else {
            result
        }
    }
}

/// Builds a link found on `page`
pub fn link(page: &str, target: &str, kind: LinkKind) -> Link {
    let page = Url::parse(page).unwrap();
    let target_url = page.join(target).unwrap();
    Link {
        is_external: crate::url::is_external(&page, &target_url),
        target_url,
        kind,
    }
}
