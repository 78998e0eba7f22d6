//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full cycle end-to-end: sitemap reading, both crawl phases and
//! the resulting statistics.

use sitemap_crawler::config::{BasicAuth, CrawlConfig, FetchConfig, LinkPolicy};
use sitemap_crawler::crawler::{
    crawl, FetchError, HttpFetcher, HttpGetter, LinkKind, OutcomeError, SitemapReader,
};
use sitemap_crawler::CrawlerError;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Builds a `<urlset>` listing the given paths on `base_url`
fn urlset(base_url: &str, paths: &[&str]) -> String {
    let entries: String = paths
        .iter()
        .map(|p| format!("<url><loc>{}{}</loc></url>", base_url, p))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{}</urlset>"#,
        entries
    )
}

async fn mount_page(server: &MockServer, page: &str, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(
            ResponseTemplate::new(status)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

async fn mount_xml(server: &MockServer, page: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "application/xml"),
        )
        .mount(server)
        .await;
}

async fn read_seeds(sitemap_url: &str) -> Vec<String> {
    SitemapReader::new(&FetchConfig::default())
        .expect("Failed to build sitemap reader")
        .read(sitemap_url)
        .await
        .expect("Failed to read sitemap")
        .into_iter()
        .map(String::from)
        .collect()
}

fn create_test_config(concurrency: i64) -> CrawlConfig {
    CrawlConfig {
        concurrency_limit: concurrency,
        fetch: FetchConfig {
            timeout: Duration::from_secs(5),
            ..FetchConfig::default()
        },
        ..CrawlConfig::default()
    }
}

#[tokio::test]
async fn test_full_crawl_all_ok() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_xml(
        &mock_server,
        "/sitemap.xml",
        urlset(&base_url, &["/", "/about", "/contact"]),
    )
    .await;
    for page in ["/", "/about", "/contact"] {
        mount_page(&mock_server, page, 200, "<html><body>ok</body></html>").await;
    }

    let seeds = read_seeds(&format!("{}/sitemap.xml", base_url)).await;
    assert_eq!(seeds.len(), 3);

    let outcome = crawl(&seeds, create_test_config(2), CancellationToken::new())
        .await
        .expect("Crawl failed");

    assert!(outcome.is_healthy());
    assert_eq!(outcome.stats.total, 3);
    assert_eq!(outcome.stats.count_200(), 3);
    assert!(outcome.stats.max_200_latency >= outcome.stats.average_200_latency);
    assert!(outcome.stats.non_200.is_empty());
}

#[tokio::test]
async fn test_not_found_is_degraded() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/ok", 200, "ok").await;
    mount_page(&mock_server, "/missing", 404, "not found").await;

    let seeds = vec![format!("{}/ok", base_url), format!("{}/missing", base_url)];
    let outcome = crawl(&seeds, create_test_config(2), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        outcome.error,
        Some(OutcomeError::Degraded {
            non_200: 1,
            total: 2
        })
    );
    assert_eq!(outcome.stats.count(404), 1);
    assert_eq!(outcome.stats.non_200.len(), 1);
    assert_eq!(outcome.stats.non_200[0].url, format!("{}/missing", base_url));
    assert!(outcome.stats.non_200[0].linking_urls.is_empty());
    assert!(outcome.stats.non_200[0].server_time <= outcome.stats.non_200[0].latency);
}

#[tokio::test]
async fn test_links_are_followed_one_hop() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        200,
        r#"<html><body>
            <a href="/about">About</a>
            <a href="/gone">Gone</a>
            <a href="/">Home</a>
            <img src="/logo.png">
        </body></html>"#,
    )
    .await;
    mount_page(
        &mock_server,
        "/about",
        200,
        r#"<html><body><a href="/deeper">Deeper</a></body></html>"#,
    )
    .await;
    mount_page(&mock_server, "/gone", 410, "gone").await;

    // Images are not followed, and the second hop is never parsed
    Mock::given(method("GET"))
        .and(path("/logo.png"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/deeper"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = CrawlConfig {
        link_policy: LinkPolicy {
            follow_hyperlinks: true,
            ..LinkPolicy::default()
        },
        ..create_test_config(2)
    };
    let home = format!("{}/", base_url);

    let outcome = crawl(&[home.clone()], config, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.stats.total, 3);
    assert_eq!(outcome.stats.count_200(), 2);
    assert_eq!(outcome.stats.count(410), 1);
    assert_eq!(outcome.stats.non_200[0].url, format!("{}/gone", base_url));
    assert_eq!(outcome.stats.non_200[0].linking_urls, vec![home]);
}

#[tokio::test]
async fn test_basic_auth_and_custom_header() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    // user:pass
    Mock::given(method("GET"))
        .and(path("/private"))
        .and(header("authorization", "Basic dXNlcjpwYXNz"))
        .and(header("x-env", "staging"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(1);
    config.fetch.basic_auth = Some(BasicAuth {
        user: "user".to_string(),
        pass: "pass".to_string(),
    });
    config.fetch.custom_header = Some("X-Env: staging".to_string());

    let outcome = crawl(
        &[format!("{}/private", base_url)],
        config,
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert!(outcome.is_healthy());
}

#[tokio::test]
async fn test_malformed_header_is_dropped() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/", 200, "ok").await;

    let mut config = create_test_config(1);
    config.fetch.custom_header = Some("not a header".to_string());

    let outcome = crawl(
        &[format!("{}/", mock_server.uri())],
        config,
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert!(outcome.is_healthy());
}

#[tokio::test]
async fn test_connection_failure_is_status_zero() {
    let outcome = crawl(
        &["http://127.0.0.1:1/".to_string()],
        create_test_config(1),
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(outcome.stats.total, 1);
    assert_eq!(outcome.stats.count(0), 1);
    assert_eq!(outcome.stats.non_200[0].status_code, 0);
    assert!(matches!(outcome.error, Some(OutcomeError::Degraded { .. })));
}

#[tokio::test]
async fn test_timeout_is_a_transport_failure() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&mock_server)
        .await;

    let config = FetchConfig {
        timeout: Duration::from_millis(100),
        ..FetchConfig::default()
    };
    let client = sitemap_crawler::crawler::build_http_client(&config).unwrap();

    let result = HttpFetcher::default()
        .get(&client, &format!("{}/slow", mock_server.uri()), &config)
        .await;

    assert_eq!(result.status_code, 0);
    assert_eq!(result.error, Some(FetchError::Timeout));
}

#[tokio::test]
async fn test_large_body_is_read_without_parsing() {
    let mock_server = MockServer::start().await;
    let body = "<a href=\"/x\">x</a>".repeat(256 * 1024);
    Mock::given(method("GET"))
        .and(path("/large"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = reqwest::Client::new();
    let result = HttpFetcher::default()
        .get(&client, &format!("{}/large", mock_server.uri()), &FetchConfig::default())
        .await;

    assert_eq!(result.status_code, 200);
    assert_eq!(result.error, None);
    assert!(result.links.is_empty());
    assert!(result.latency >= result.timing.server);
    assert_eq!(result.latency, result.timing.server + result.timing.transfer);
}

#[tokio::test]
async fn test_fetcher_extracts_links_when_asked() {
    let mock_server = MockServer::start().await;
    mount_page(
        &mock_server,
        "/",
        404,
        r#"<html><body><a href="/a">A</a><img src="https://cdn.example.org/x.png"></body></html>"#,
    )
    .await;

    let url = format!("{}/", mock_server.uri());
    let client = reqwest::Client::new();
    let fetcher = HttpFetcher::default();

    let without = fetcher.get(&client, &url, &FetchConfig::default()).await;
    assert_eq!(without.status_code, 404);
    assert!(without.links.is_empty());

    let config = FetchConfig {
        parse_links: true,
        ..FetchConfig::default()
    };
    let with = fetcher.get(&client, &url, &config).await;
    assert_eq!(with.links.len(), 2);
    assert_eq!(with.links[0].target_url.as_str(), format!("{}/a", mock_server.uri()));
    assert_eq!(with.links[1].kind, LinkKind::Image);
    assert!(with.links[1].is_external);
}

#[tokio::test]
async fn test_host_override_targets_other_server() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/page", 200, "ok").await;

    let address = mock_server.address().to_string();
    let config = CrawlConfig {
        host_override: Some(address),
        ..create_test_config(1)
    };

    let outcome = crawl(
        &["http://www.example.invalid/page".to_string()],
        config,
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert!(outcome.is_healthy());
    assert_eq!(outcome.stats.total, 1);
}

#[tokio::test]
async fn test_sitemap_index_is_expanded_once() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_xml(
        &mock_server,
        "/sitemap_index.xml",
        format!(
            r#"<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <sitemap><loc>{0}/sitemap-pages.xml</loc></sitemap>
  <sitemap><loc>{0}/sitemap-broken.xml</loc></sitemap>
  <sitemap><loc>{0}/sitemap-nested.xml</loc></sitemap>
  <sitemap><loc>{0}/sitemap-posts.xml</loc></sitemap>
</sitemapindex>"#,
            base_url
        ),
    )
    .await;
    mount_xml(&mock_server, "/sitemap-pages.xml", urlset(&base_url, &["/", "/about"])).await;
    mount_xml(&mock_server, "/sitemap-posts.xml", urlset(&base_url, &["/posts/1"])).await;
    mount_xml(
        &mock_server,
        "/sitemap-nested.xml",
        format!(
            r#"<sitemapindex><sitemap><loc>{}/sitemap-deep.xml</loc></sitemap></sitemapindex>"#,
            base_url
        ),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/sitemap-deep.xml"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let seeds = read_seeds(&format!("{}/sitemap_index.xml", base_url)).await;

    assert_eq!(
        seeds,
        vec![
            format!("{}/", base_url),
            format!("{}/about", base_url),
            format!("{}/posts/1", base_url)
        ]
    );
}

#[tokio::test]
async fn test_sitemap_failure_is_an_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let result = SitemapReader::new(&FetchConfig::default())
        .unwrap()
        .read(&format!("{}/sitemap.xml", mock_server.uri()))
        .await;

    assert!(matches!(result, Err(CrawlerError::Sitemap { .. })));
}

#[tokio::test]
async fn test_empty_sitemap_crawls_nothing() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    mount_xml(&mock_server, "/sitemap.xml", urlset(&base_url, &[])).await;

    let seeds = read_seeds(&format!("{}/sitemap.xml", base_url)).await;
    let outcome = crawl(&seeds, create_test_config(4), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.stats.total, 0);
    assert_eq!(outcome.error, Some(OutcomeError::NothingCrawled));
}
