use crate::config::types::Settings;
use crate::config::validation::validate;
use crate::ConfigError;
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Settings)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use sitemap_crawler::config::load_config;
///
/// let settings = load_config(Path::new("crawler.toml")).unwrap();
/// println!("Concurrency: {}", settings.crawl.concurrency);
/// ```
pub fn load_config(path: &Path) -> Result<Settings, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from TOML text
pub fn parse_config(content: &str) -> Result<Settings, ConfigError> {
    let settings: Settings = toml::from_str(content)?;
    validate(&settings)?;
    Ok(settings)
}
