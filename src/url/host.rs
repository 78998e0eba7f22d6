use crate::{UrlError, UrlResult};
use url::{Host, Url};

/// A parsed `--host` override: a host name or IP, optionally with a port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostOverride {
    pub host: String,
    pub port: Option<u16>,
}

/// Parses a host override such as `staging.example.com`,
/// `127.0.0.1:8080` or `[::1]:8080`
pub fn parse_host_override(raw: &str) -> UrlResult<HostOverride> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(UrlError::MissingHost);
    }

    if raw
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '/' | '?' | '#' | '@'))
    {
        return Err(UrlError::InvalidHost(raw.to_string()));
    }

    let (host_part, port) = split_port(raw)?;
    let host = Host::parse(host_part).map_err(|e| UrlError::InvalidHost(e.to_string()))?;

    Ok(HostOverride {
        host: host.to_string(),
        port,
    })
}

/// Splits an optional trailing `:port` off a host, honouring bracketed IPv6
fn split_port(raw: &str) -> UrlResult<(&str, Option<u16>)> {
    let parse_port = |port: &str| {
        port.parse::<u16>()
            .map_err(|_| UrlError::InvalidHost(raw.to_string()))
    };

    if raw.starts_with('[') {
        let end = raw
            .find(']')
            .ok_or_else(|| UrlError::InvalidHost(raw.to_string()))?;
        let (host, tail) = raw.split_at(end + 1);
        return match tail.strip_prefix(':') {
            Some(port) => Ok((host, Some(parse_port(port)?))),
            None if tail.is_empty() => Ok((host, None)),
            None => Err(UrlError::InvalidHost(raw.to_string())),
        };
    }

    match raw.split_once(':') {
        Some((host, port)) => Ok((host, Some(parse_port(port)?))),
        None => Ok((raw, None)),
    }
}

/// Replaces the host and port of a single URL
///
/// The override replaces the whole authority: when it carries no port, any
/// port present in the original URL is dropped as well.
///
/// # Examples
///
/// ```
/// use sitemap_crawler::url::{parse_host_override, rewrite_url_host};
///
/// let host = parse_host_override("staging.example.com").unwrap();
/// let url = rewrite_url_host("https://www.example.com/about?x=1", &host).unwrap();
/// assert_eq!(url, "https://staging.example.com/about?x=1");
/// ```
pub fn rewrite_url_host(url: &str, host: &HostOverride) -> UrlResult<String> {
    let mut parsed = Url::parse(url).map_err(|e| UrlError::Parse(e.to_string()))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(UrlError::InvalidScheme(parsed.scheme().to_string()));
    }

    parsed
        .set_host(Some(&host.host))
        .map_err(|e| UrlError::InvalidHost(e.to_string()))?;
    parsed
        .set_port(host.port)
        .map_err(|_| UrlError::InvalidHost(format!("cannot set port on {}", url)))?;

    Ok(parsed.to_string())
}

/// Rewrites the host of every URL in the list
///
/// URLs that cannot be rewritten are kept unchanged (and logged), so the
/// crawl still accounts for them exactly once.
pub fn rewrite_urls_host(urls: &[String], host: &HostOverride) -> Vec<String> {
    urls.iter()
        .map(|url| match rewrite_url_host(url, host) {
            Ok(rewritten) => rewritten,
            Err(e) => {
                tracing::warn!("Cannot override host of {}: {}", url, e);
                url.clone()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_host() {
        let host = parse_host_override("staging.example.com").unwrap();
        assert_eq!(host.host, "staging.example.com");
        assert_eq!(host.port, None);
    }

    #[test]
    fn test_parse_host_with_port() {
        let host = parse_host_override("127.0.0.1:8080").unwrap();
        assert_eq!(host.host, "127.0.0.1");
        assert_eq!(host.port, Some(8080));
    }

    #[test]
    fn test_parse_ipv6_with_port() {
        let host = parse_host_override("[::1]:3000").unwrap();
        assert_eq!(host.host, "[::1]");
        assert_eq!(host.port, Some(3000));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_host_override("").is_err());
        assert!(parse_host_override("example.com/path").is_err());
        assert!(parse_host_override("user@example.com").is_err());
        assert!(parse_host_override("example.com:notaport").is_err());
    }

    #[test]
    fn test_rewrite_keeps_path_and_query() {
        let host = parse_host_override("localhost:9000").unwrap();
        let url = rewrite_url_host("http://example.com/a/b?c=d", &host).unwrap();
        assert_eq!(url, "http://localhost:9000/a/b?c=d");
    }

    #[test]
    fn test_rewrite_drops_original_port() {
        let host = parse_host_override("example.org").unwrap();
        let url = rewrite_url_host("http://example.com:8080/", &host).unwrap();
        assert_eq!(url, "http://example.org/");
    }

    #[test]
    fn test_rewrite_list_keeps_unparsable_urls() {
        let host = parse_host_override("example.org").unwrap();
        let urls = vec![
            "https://example.com/one".to_string(),
            "not a url".to_string(),
        ];
        let rewritten = rewrite_urls_host(&urls, &host);
        assert_eq!(
            rewritten,
            vec!["https://example.org/one".to_string(), "not a url".to_string()]
        );
    }
}
