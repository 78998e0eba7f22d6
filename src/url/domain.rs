use url::Url;

/// Extracts the host from a URL, lowercased
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sitemap_crawler::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns true if `target` lives on a different host than `base`
///
/// Ports and schemes are ignored, so `http://example.com` and
/// `https://example.com:8443` count as the same site. A target without a
/// host is treated as external.
pub fn is_external(base: &Url, target: &Url) -> bool {
    match (extract_domain(base), extract_domain(target)) {
        (Some(base_host), Some(target_host)) => base_host != target_host,
        _ => true,
    }
}
