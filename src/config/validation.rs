use crate::config::types::{CrawlSection, HttpSection, Settings};
use crate::crawler::parse_custom_header;
use crate::url::parse_host_override;
use crate::ConfigError;

/// Validates the entire configuration
///
/// Problems the crawl can recover from on its own (a non-positive
/// concurrency, a malformed custom header) are only logged.
pub fn validate(settings: &Settings) -> Result<(), ConfigError> {
    validate_crawl_section(&settings.crawl)?;
    validate_http_section(&settings.http)?;
    Ok(())
}

/// Validates the `[crawl]` section
fn validate_crawl_section(section: &CrawlSection) -> Result<(), ConfigError> {
    if section.concurrency <= 0 {
        tracing::warn!(
            "concurrency must be >= 1, got {}; 1 will be used",
            section.concurrency
        );
    }

    if let Some(host) = section.host.as_deref().filter(|h| !h.is_empty()) {
        parse_host_override(host).map_err(|e| ConfigError::InvalidHost(e.to_string()))?;
    }

    Ok(())
}

/// Validates the `[http]` section
fn validate_http_section(section: &HttpSection) -> Result<(), ConfigError> {
    if section.timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "timeout-ms must be greater than 0".to_string(),
        ));
    }

    if section.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    let has_user = section.user.as_deref().is_some_and(|u| !u.is_empty());
    let has_pass = section.pass.as_deref().is_some_and(|p| !p.is_empty());
    if has_pass && !has_user {
        return Err(ConfigError::Validation(
            "a password was given without a user".to_string(),
        ));
    }

    if let Some(header) = section.header.as_deref().filter(|h| !h.is_empty()) {
        if parse_custom_header(header).is_none() {
            tracing::warn!(
                "Invalid custom header format '{}', expected 'Key: Value'; it will be ignored",
                header
            );
        }
    }

    Ok(())
}
