//! HTML link extraction
//!
//! Pages fetched during the seed phase are scanned for hyperlinks
//! (`<a href>`) and images (`<img src>`), which become candidates for the
//! second hop.

use crate::url::is_external;
use crate::CrawlerError;
use scraper::{Html, Selector};
use url::Url;

/// What kind of element a link came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkKind {
    Hyperlink,
    Image,
}

/// A link found on a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// Absolute target, without fragment
    pub target_url: Url,
    pub kind: LinkKind,

    /// True if the target is on another host than the page it was found on
    pub is_external: bool,
}

/// Turns a response body into the links it contains
pub trait LinkExtractor: Send + Sync {
    fn extract(&self, body: &str, base_url: &Url) -> Result<Vec<Link>, CrawlerError>;
}

/// [`LinkExtractor`] backed by `scraper`
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlLinkExtractor;

impl LinkExtractor for HtmlLinkExtractor {
    fn extract(&self, body: &str, base_url: &Url) -> Result<Vec<Link>, CrawlerError> {
        extract_links(body, base_url)
    }
}

/// Extracts hyperlinks and images from an HTML document, in document order
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` as [`LinkKind::Hyperlink`]
/// - `<img src="...">` as [`LinkKind::Image`]
///
/// **Exclude:**
/// - `javascript:`, `mailto:`, `tel:` and `data:` links
/// - Fragment-only links (same page anchors)
/// - Anything that does not resolve to an HTTP(S) URL
///
/// Relative links resolve against `<base href>` when the page has one,
/// otherwise against `base_url`. Whether a link is external is always
/// decided against `base_url`, the URL that was requested.
///
/// # Example
///
/// ```
/// use sitemap_crawler::crawler::{extract_links, LinkKind};
/// use url::Url;
///
/// let html = r#"<a href="/about">About</a><img src="https://cdn.example.net/a.png">"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let links = extract_links(html, &base_url).unwrap();
/// assert_eq!(links[0].target_url.as_str(), "https://example.com/about");
/// assert_eq!(links[1].kind, LinkKind::Image);
/// assert!(links[1].is_external);
/// ```
pub fn extract_links(html: &str, base_url: &Url) -> Result<Vec<Link>, CrawlerError> {
    let document = Html::parse_document(html);
    let resolve_base = document_base(&document, base_url);

    let selector = Selector::parse("a[href], img[src]").map_err(|e| CrawlerError::HtmlParse {
        url: base_url.to_string(),
        message: format!("{:?}", e),
    })?;

    let mut links = Vec::new();
    for element in document.select(&selector) {
        let (kind, attr) = match element.value().name() {
            "img" => (LinkKind::Image, "src"),
            _ => (LinkKind::Hyperlink, "href"),
        };

        if let Some(target_url) = element
            .value()
            .attr(attr)
            .and_then(|value| resolve_link(value, &resolve_base))
        {
            links.push(Link {
                is_external: is_external(base_url, &target_url),
                target_url,
                kind,
            });
        }
    }

    Ok(links)
}

/// Returns the `<base href>` of the document if present and valid
fn document_base(document: &Html, base_url: &Url) -> Url {
    Selector::parse("base[href]")
        .ok()
        .and_then(|selector| {
            document
                .select(&selector)
                .next()
                .and_then(|element| element.value().attr("href"))
                .and_then(|href| base_url.join(href.trim()).ok())
        })
        .unwrap_or_else(|| base_url.clone())
}

/// Resolves an attribute value to an absolute HTTP(S) URL without fragment
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
    {
        return None;
    }

    let mut absolute_url = base_url.join(href).ok()?;
    if absolute_url.scheme() != "http" && absolute_url.scheme() != "https" {
        return None;
    }
    absolute_url.set_fragment(None);
    Some(absolute_url)
}
