use serde::Deserialize;
use std::time::Duration;

/// Default per-request timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Default number of concurrent requests
pub const DEFAULT_CONCURRENCY: i64 = 10;

/// Default user agent sent with every request
pub const DEFAULT_USER_AGENT: &str = concat!("sitemap-crawler/", env!("CARGO_PKG_VERSION"));

/// Configuration file layout
///
/// Every section is optional so a file only needs to carry what it overrides.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub crawl: CrawlSection,
    pub http: HttpSection,
    pub links: LinkPolicy,
}

/// `[crawl]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlSection {
    /// Maximum number of concurrent requests. Non-positive values are
    /// accepted and coerced to 1 when a crawl starts.
    pub concurrency: i64,

    /// Replaces the host (and optionally the port) of every seed URL
    pub host: Option<String>,
}

impl Default for CrawlSection {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            host: None,
        }
    }
}

/// `[http]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct HttpSection {
    /// Per-request timeout (milliseconds)
    pub timeout_ms: u64,

    /// Basic auth user name
    pub user: Option<String>,

    /// Basic auth password
    pub pass: Option<String>,

    /// One extra request header, formatted as `Key: Value`
    pub header: Option<String>,

    pub user_agent: String,
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            user: None,
            pass: None,
            header: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Which discovered links are followed for the second hop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LinkPolicy {
    /// Follow links whose host differs from the page they were found on
    pub follow_external: bool,

    /// Follow `<a href>` links
    pub follow_hyperlinks: bool,

    /// Follow `<img src>` links
    pub follow_images: bool,
}

impl LinkPolicy {
    /// Returns true if any kind of link should be followed, which is also
    /// what decides whether pages are parsed for links at all
    pub fn any_enabled(&self) -> bool {
        self.follow_external || self.follow_hyperlinks || self.follow_images
    }
}

/// Basic auth credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicAuth {
    pub user: String,
    pub pass: String,
}

/// Settings applied to every single request
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub timeout: Duration,
    pub basic_auth: Option<BasicAuth>,

    /// Raw `Key: Value` header; malformed values are dropped at request time
    pub custom_header: Option<String>,

    pub user_agent: String,

    /// Whether response bodies are handed to the link extractor
    pub parse_links: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            basic_auth: None,
            custom_header: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            parse_links: false,
        }
    }
}

/// Runtime configuration of a single crawl
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Maximum number of concurrent requests (coerced to at least 1)
    pub concurrency_limit: i64,

    pub host_override: Option<String>,
    pub fetch: FetchConfig,
    pub link_policy: LinkPolicy,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            concurrency_limit: DEFAULT_CONCURRENCY,
            host_override: None,
            fetch: FetchConfig::default(),
            link_policy: LinkPolicy::default(),
        }
    }
}

impl CrawlConfig {
    /// The concurrency limit actually used: anything below 1 becomes 1
    pub fn effective_concurrency(&self) -> usize {
        if self.concurrency_limit <= 0 {
            1
        } else {
            self.concurrency_limit as usize
        }
    }
}

impl From<Settings> for CrawlConfig {
    fn from(settings: Settings) -> Self {
        let basic_auth = settings
            .http
            .user
            .filter(|user| !user.is_empty())
            .map(|user| BasicAuth {
                user,
                pass: settings.http.pass.unwrap_or_default(),
            });

        Self {
            concurrency_limit: settings.crawl.concurrency,
            host_override: settings.crawl.host.filter(|h| !h.is_empty()),
            fetch: FetchConfig {
                timeout: Duration::from_millis(settings.http.timeout_ms),
                basic_auth,
                custom_header: settings.http.header.filter(|h| !h.is_empty()),
                user_agent: settings.http.user_agent,
                parse_links: settings.links.any_enabled(),
            },
            link_policy: settings.links,
        }
    }
}
