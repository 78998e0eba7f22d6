//! HTTP fetcher implementation
//!
//! This module performs the single GET requests of a crawl:
//! - Building HTTP clients with the configured timeout and user agent
//! - Applying basic auth and the optional custom header
//! - Timing the request (time to headers, body transfer, total)
//! - Classifying transport failures
//! - Handing bodies to the link extractor when links are requested
//!
//! A fetch never fails: every outcome, including transport errors, is
//! described by the returned [`FetchResult`].

use crate::config::FetchConfig;
use crate::crawler::parser::{HtmlLinkExtractor, Link, LinkExtractor};
use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::{Client, RequestBuilder, Response};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use url::Url;

/// Why a request produced no HTTP response
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Request failed: {0}")]
    Request(String),
}

/// Where the time of a request went
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchTiming {
    /// From sending the request until the response headers arrived
    pub server: Duration,

    /// Reading the response body
    pub transfer: Duration,
}

/// Outcome of fetching one URL
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub url: String,

    /// HTTP status code, 0 when no response was received
    pub status_code: u16,

    /// Total elapsed time of the request
    pub latency: Duration,

    pub timing: FetchTiming,
    pub error: Option<FetchError>,

    /// Links found in the body; empty unless links were requested
    pub links: Vec<Link>,
}

impl FetchResult {
    /// A result for a received response
    pub fn new(url: impl Into<String>, status_code: u16, latency: Duration) -> Self {
        Self {
            url: url.into(),
            status_code,
            latency,
            timing: FetchTiming::default(),
            error: None,
            links: Vec::new(),
        }
    }

    /// A result for a request that got no response
    pub fn failed(url: impl Into<String>, latency: Duration, error: FetchError) -> Self {
        Self {
            error: Some(error),
            ..Self::new(url, 0, latency)
        }
    }

    pub fn with_links(mut self, links: Vec<Link>) -> Self {
        self.links = links;
        self
    }

    /// Returns true if the request failed below the HTTP layer
    pub fn is_transport_failure(&self) -> bool {
        self.error.is_some()
    }
}

/// Performs one GET request with a given client
///
/// Implementations must not panic and must not hang past the client's
/// timeout; all failures are reported through the returned result.
#[async_trait]
pub trait HttpGetter: Send + Sync {
    async fn get(&self, client: &Client, url: &str, config: &FetchConfig) -> FetchResult;
}

/// The [`HttpGetter`] used for real crawls
#[derive(Clone)]
pub struct HttpFetcher {
    extractor: Arc<dyn LinkExtractor>,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(Arc::new(HtmlLinkExtractor))
    }
}

impl HttpFetcher {
    pub fn new(extractor: Arc<dyn LinkExtractor>) -> Self {
        Self { extractor }
    }

    async fn fetch(&self, client: &Client, url: &str, config: &FetchConfig) -> FetchResult {
        let start = Instant::now();

        let request_url = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(e) => {
                return FetchResult::failed(url, start.elapsed(), FetchError::InvalidUrl(e.to_string()))
            }
        };

        let request = configure_request(client.get(request_url.clone()), config);
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => return FetchResult::failed(url, start.elapsed(), classify_error(&e)),
        };

        let server = start.elapsed();
        let status_code = response.status().as_u16();

        // The body is always read so the transfer time is part of the latency
        let body = if config.parse_links {
            response.text().await.map(Some)
        } else {
            drain(response).await.map(|_| None)
        };

        let latency = start.elapsed();
        let mut result = FetchResult::new(url, status_code, latency);
        result.timing = FetchTiming {
            server,
            transfer: latency.saturating_sub(server),
        };

        match body {
            Ok(Some(body)) => match self.extractor.extract(&body, &request_url) {
                Ok(links) => result.links = links,
                Err(e) => tracing::error!("Error extracting page links of {}: {}", url, e),
            },
            Ok(None) => {}
            Err(e) => tracing::warn!("Failed to read response body of {}: {}", url, e),
        }

        result
    }
}

/// Reads a body to the end without keeping it
async fn drain(mut response: Response) -> Result<(), reqwest::Error> {
    while response.chunk().await?.is_some() {}
    Ok(())
}

#[async_trait]
impl HttpGetter for HttpFetcher {
    async fn get(&self, client: &Client, url: &str, config: &FetchConfig) -> FetchResult {
        let result = self.fetch(client, url, config).await;
        log_result(&result);
        result
    }
}

/// Builds an HTTP client with the configured timeout and user agent
///
/// # Example
///
/// ```
/// use sitemap_crawler::config::FetchConfig;
/// use sitemap_crawler::crawler::build_http_client;
///
/// let client = build_http_client(&FetchConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(config.timeout)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Parses a `Key: Value` header
///
/// Returns None if there is no colon, the name is empty, or either part is
/// not a valid header name/value.
pub fn parse_custom_header(raw: &str) -> Option<(HeaderName, HeaderValue)> {
    let (key, value) = raw.split_once(':')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }

    let name = HeaderName::from_bytes(key.as_bytes()).ok()?;
    let value = HeaderValue::from_str(value.trim()).ok()?;
    Some((name, value))
}

/// Applies basic auth and the custom header to a request
pub(crate) fn configure_request(mut request: RequestBuilder, config: &FetchConfig) -> RequestBuilder {
    if let Some(auth) = config.basic_auth.as_ref().filter(|a| !a.user.is_empty()) {
        request = request.basic_auth(&auth.user, Some(&auth.pass));
    }

    if let Some(raw) = config.custom_header.as_deref().filter(|h| !h.is_empty()) {
        match parse_custom_header(raw) {
            Some((name, value)) => request = request.header(name, value),
            None => tracing::warn!("Invalid custom header format, expected 'Key: Value'"),
        }
    }

    request
}

/// Maps a reqwest error to the kind of transport failure it represents
fn classify_error(error: &reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout
    } else if error.is_connect() {
        FetchError::Connect(error.to_string())
    } else {
        FetchError::Request(error.to_string())
    }
}

fn log_result(result: &FetchResult) {
    let total_ms = result.latency.as_millis() as u64;

    match &result.error {
        Some(error) => tracing::warn!(
            url = %result.url,
            status = result.status_code,
            total_ms,
            "{}",
            error
        ),
        None => tracing::info!(url = %result.url, status = result.status_code, total_ms),
    }

    tracing::debug!(
        url = %result.url,
        server_ms = result.timing.server.as_millis() as u64,
        transfer_ms = result.timing.transfer.as_millis() as u64,
        links = result.links.len(),
        "timing"
    );
}
