//! Sitemap reading
//!
//! Turns a sitemap URL into the ordered list of page URLs used as crawl
//! seeds. A `<sitemapindex>` is expanded one level deep; child sitemaps that
//! are indexes themselves are skipped.

use crate::config::FetchConfig;
use crate::crawler::fetcher::{build_http_client, configure_request};
use crate::CrawlerError;
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::Client;
use url::Url;

/// Root element of a sitemap document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SitemapKind {
    /// `<urlset>`: locations are pages
    UrlSet,

    /// `<sitemapindex>`: locations are other sitemaps
    Index,
}

/// A parsed sitemap document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapDocument {
    pub kind: SitemapKind,
    pub locations: Vec<Url>,
}

/// Fetches sitemaps with the crawl's HTTP settings
pub struct SitemapReader {
    client: Client,
    config: FetchConfig,
}

impl SitemapReader {
    pub fn new(config: &FetchConfig) -> Result<Self, CrawlerError> {
        let client = build_http_client(config).map_err(CrawlerError::ClientBuild)?;
        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: Client, config: &FetchConfig) -> Self {
        Self {
            client,
            config: config.clone(),
        }
    }

    /// Reads the page URLs listed by a sitemap
    ///
    /// # Errors
    ///
    /// Fails if the root sitemap cannot be fetched or parsed. Failing child
    /// sitemaps of an index are logged and skipped.
    pub async fn read(&self, sitemap_url: &str) -> Result<Vec<Url>, CrawlerError> {
        let root_url = Url::parse(sitemap_url)?;
        let root = self.fetch_document(&root_url).await?;

        match root.kind {
            SitemapKind::UrlSet => {
                tracing::info!("Sitemap {} lists {} URL(s)", root_url, root.locations.len());
                Ok(root.locations)
            }
            SitemapKind::Index => {
                tracing::info!(
                    "Sitemap index {} lists {} sitemap(s)",
                    root_url,
                    root.locations.len()
                );

                let mut urls = Vec::new();
                for child_url in &root.locations {
                    match self.fetch_document(child_url).await {
                        Ok(child) if child.kind == SitemapKind::UrlSet => {
                            tracing::debug!(
                                "Sitemap {} lists {} URL(s)",
                                child_url,
                                child.locations.len()
                            );
                            urls.extend(child.locations);
                        }
                        Ok(_) => tracing::warn!("Skipping nested sitemap index {}", child_url),
                        Err(e) => tracing::warn!("Skipping sitemap {}: {}", child_url, e),
                    }
                }
                Ok(urls)
            }
        }
    }

    async fn fetch_document(&self, url: &Url) -> Result<SitemapDocument, CrawlerError> {
        let http_error = |source| CrawlerError::Http {
            url: url.to_string(),
            source,
        };

        let response = configure_request(self.client.get(url.clone()), &self.config)
            .send()
            .await
            .map_err(http_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(CrawlerError::Sitemap {
                url: url.to_string(),
                message: format!("HTTP {}", status),
            });
        }

        let body = response.bytes().await.map_err(http_error)?;
        parse_sitemap(&body, url)
    }
}

/// Parses a sitemap document
///
/// Only `<loc>` elements directly inside `<url>` or `<sitemap>` count, so
/// extension tags such as `<image:loc>` are ignored. Relative locations
/// resolve against `base_url`; locations that do not resolve to an HTTP(S)
/// URL are logged and skipped.
///
/// # Example
///
/// ```
/// use sitemap_crawler::crawler::{parse_sitemap, SitemapKind};
/// use url::Url;
///
/// let xml = br#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
///   <url><loc>https://example.com/</loc></url>
///   <url><loc>/about</loc></url>
/// </urlset>"#;
/// let base_url = Url::parse("https://example.com/sitemap.xml").unwrap();
/// let document = parse_sitemap(xml, &base_url).unwrap();
/// assert_eq!(document.kind, SitemapKind::UrlSet);
/// assert_eq!(document.locations[1].as_str(), "https://example.com/about");
/// ```
pub fn parse_sitemap(xml: &[u8], base_url: &Url) -> Result<SitemapDocument, CrawlerError> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut path: Vec<Vec<u8>> = Vec::new();
    let mut kind = None;
    let mut current_loc: Option<String> = None;
    let mut locations = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                let name = e.local_name().as_ref().to_vec();
                if path.is_empty() {
                    kind = Some(match name.as_slice() {
                        b"urlset" => SitemapKind::UrlSet,
                        b"sitemapindex" => SitemapKind::Index,
                        other => {
                            return Err(CrawlerError::Sitemap {
                                url: base_url.to_string(),
                                message: format!(
                                    "unexpected root element <{}>",
                                    String::from_utf8_lossy(other)
                                ),
                            })
                        }
                    });
                }
                path.push(name);
                if is_entry_loc(&path) {
                    current_loc = Some(String::new());
                }
            }
            Event::End(_) => {
                if is_entry_loc(&path) {
                    if let Some(loc) = current_loc.take() {
                        push_location(&mut locations, &loc, base_url);
                    }
                }
                path.pop();
            }
            Event::Text(text) => {
                if let Some(loc) = current_loc.as_mut() {
                    loc.push_str(&text.unescape()?);
                }
            }
            Event::CData(data) => {
                if let Some(loc) = current_loc.as_mut() {
                    loc.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    let kind = kind.ok_or_else(|| CrawlerError::Sitemap {
        url: base_url.to_string(),
        message: "empty document".to_string(),
    })?;

    Ok(SitemapDocument { kind, locations })
}

/// Returns true if `path` ends in `<url><loc>` or `<sitemap><loc>`
fn is_entry_loc(path: &[Vec<u8>]) -> bool {
    match path {
        [.., parent, leaf] => {
            leaf.as_slice() == b"loc"
                && matches!(parent.as_slice(), b"url" | b"sitemap")
        }
        _ => false,
    }
}

fn push_location(locations: &mut Vec<Url>, raw: &str, base_url: &Url) {
    let raw = raw.trim();
    if raw.is_empty() {
        return;
    }

    match base_url.join(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => locations.push(url),
        Ok(url) => tracing::warn!("Skipping sitemap location with scheme {}: {}", url.scheme(), raw),
        Err(e) => tracing::warn!("Skipping invalid sitemap location {}: {}", raw, e),
    }
}
