//! Sitemap-crawler: a bounded, one-hop site health checker
//!
//! This crate crawls the URLs listed in a sitemap with a fixed number of
//! concurrent requests, optionally follows the links found on those pages for
//! exactly one more hop, and reports status code and latency statistics.

pub mod config;
pub mod crawler;
pub mod output;
pub mod stats;
pub mod url;

use thiserror::Error;

/// Main error type for crawler operations
#[derive(Debug, Error)]
pub enum CrawlerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(reqwest::Error),

    #[error("Sitemap error for {url}: {message}")]
    Sitemap { url: String, message: String },

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTML parse error for {url}: {message}")]
    HtmlParse { url: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid host override: {0}")]
    InvalidHost(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,

    #[error("Invalid host: {0}")]
    InvalidHost(String),
}

/// Result type alias for crawler operations
pub type Result<T> = std::result::Result<T, CrawlerError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::{CrawlConfig, FetchConfig, LinkPolicy};
pub use crawler::{crawl, CrawlOutcome, OutcomeError};
pub use stats::{merge, CrawlReport, CrawlStats};
