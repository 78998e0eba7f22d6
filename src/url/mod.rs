//! URL handling module
//!
//! Host extraction, internal/external classification of links, and the
//! host override applied to seed URLs.

mod domain;
mod host;

pub use domain::{extract_domain, is_external};
pub use host::{parse_host_override, rewrite_url_host, rewrite_urls_host, HostOverride};
