//! Configuration module for the crawler
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files, and turning them into the runtime [`CrawlConfig`].
//!
//! # Example
//!
//! ```no_run
//! use sitemap_crawler::config::{load_config, CrawlConfig};
//! use std::path::Path;
//!
//! let settings = load_config(Path::new("crawler.toml")).unwrap();
//! let config = CrawlConfig::from(settings);
//! println!("Crawler will use {} clients", config.effective_concurrency());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BasicAuth, CrawlConfig, CrawlSection, FetchConfig, HttpSection, LinkPolicy, Settings,
    DEFAULT_CONCURRENCY, DEFAULT_TIMEOUT_MS, DEFAULT_USER_AGENT,
};

// Re-export parser functions
pub use parser::{load_config, parse_config};
pub use validation::validate;
