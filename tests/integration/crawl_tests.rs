//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use sitewave::config::{
    Config, CrawlerConfig, FilterConfig, HttpConfig, OutputConfig, UserAgentConfig,
};
use sitewave::crawler::{self, build_http_client, CrawlLimits, Crawler, Fetcher};
use sitewave::observer::{CrawlEvent, RecordingObserver};
use sitewave::{ConfigError, SitewaveError};
use std::sync::Arc;
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const AGENT: &str = "TestBot";

fn user_agent() -> UserAgentConfig {
    UserAgentConfig {
        crawler_name: AGENT.to_string(),
        crawler_version: "1.0.0".to_string(),
        contact_url: "https://example.com/contact".to_string(),
    }
}

/// Creates a test configuration pointing at the mock server
fn create_test_config(start_url: &str, output_dir: &str) -> Config {
    Config {
        crawler: CrawlerConfig {
            start_url: start_url.to_string(),
            max_pages: 100,
            max_depth: 3,
            concurrency: 4,
            delay_ms: 0,
            max_requests_per_window: None,
            window_secs: 60,
        },
        user_agent: user_agent(),
        http: HttpConfig::default(),
        output: OutputConfig {
            directory: output_dir.to_string(),
            max_per_file: 50_000,
            public_base: None,
        },
        filter: FilterConfig::default(),
    }
}

fn create_crawler() -> Crawler {
    let client = build_http_client(&user_agent(), &HttpConfig::default()).unwrap();
    Crawler::new(Fetcher::new(client, 4).unwrap(), AGENT)
}

fn limits(max_pages: usize, max_depth: u32) -> CrawlLimits {
    CrawlLimits {
        max_pages,
        max_depth,
    }
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        format!("<html><body>{}</body></html>", body),
        "text/html",
    )
}

async fn mount_page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html(body))
        .mount(server)
        .await;
}

async fn mount_robots(server: &MockServer, content: &str) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(content))
        .mount(server)
        .await;
}

fn urls(report: &crawler::CrawlReport) -> Vec<String> {
    report.pages.iter().map(|page| page.url.clone()).collect()
}

#[tokio::test]
async fn test_robots_disallowed_link_not_crawled() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_robots(&server, "User-agent: *\nDisallow: /b").await;
    mount_page(&server, "/", r#"<a href="/a">A</a><a href="/b">B</a>"#).await;
    mount_page(&server, "/a", r#"<a href="/c">C</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(html("blocked"))
        .expect(0)
        .mount(&server)
        .await;

    let report = create_crawler()
        .crawl(&format!("{}/", base), limits(10, 1))
        .await
        .unwrap();

    assert_eq!(urls(&report), vec![format!("{}/", base), format!("{}/a", base)]);
}

#[tokio::test]
async fn test_robots_missing_allows_everything() {
    let server = MockServer::start().await;
    let base = server.uri();

    // No robots.txt mock: wiremock answers 404
    mount_page(&server, "/", r#"<a href="/a">A</a><a href="/b">B</a>"#).await;
    mount_page(&server, "/a", "a").await;
    mount_page(&server, "/b", "b").await;

    let observer = Arc::new(RecordingObserver::new());
    let report = create_crawler()
        .with_observer(observer.clone())
        .crawl(&format!("{}/", base), limits(10, 2))
        .await
        .unwrap();

    assert_eq!(report.pages.len(), 3);
    assert!(observer.events().contains(&CrawlEvent::RobotsLoaded {
        allow_rules: 0,
        disallow_rules: 0
    }));
}

#[tokio::test]
async fn test_robots_agent_specific_group() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_robots(
        &server,
        "User-agent: OtherBot\nDisallow: /\n\nUser-agent: testbot\nDisallow: /private",
    )
    .await;
    mount_page(&server, "/", r#"<a href="/public">P</a><a href="/private">X</a>"#).await;
    mount_page(&server, "/public", "p").await;

    let report = create_crawler()
        .crawl(&format!("{}/", base), limits(10, 2))
        .await
        .unwrap();

    assert_eq!(
        urls(&report),
        vec![format!("{}/", base), format!("{}/public", base)]
    );
}

#[tokio::test]
async fn test_canonical_urls_collapse() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        r#"<a href="/item?ref=nav">Nav</a><a href="/item?ref=footer">Footer</a>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/item"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"<html><head><link rel="canonical" href="/item"></head><body>item</body></html>"#,
            "text/html",
        ))
        .expect(2)
        .mount(&server)
        .await;

    let report = create_crawler()
        .crawl(&format!("{}/", base), limits(10, 2))
        .await
        .unwrap();

    assert_eq!(
        urls(&report),
        vec![format!("{}/", base), format!("{}/item", base)]
    );
    assert_eq!(report.stats.processed, 3);
}

#[tokio::test]
async fn test_page_ceiling_stops_batches() {
    let server = MockServer::start().await;
    let base = server.uri();

    let links: String = (0..30).map(|i| format!(r#"<a href="/p{i}">{i}</a>"#)).collect();
    mount_page(&server, "/", &links).await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/p\d+$"))
        .respond_with(html(&links))
        .mount(&server)
        .await;

    let report = create_crawler()
        .crawl(&format!("{}/", base), limits(10, 5))
        .await
        .unwrap();

    assert_eq!(report.pages.len(), 10);
    // Seed batch, then one batch of 9 fills the ceiling
    assert_eq!(report.stats.batches, 2);
    assert_eq!(report.stats.processed, 10);
}

#[tokio::test]
async fn test_depth_bound() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", r#"<a href="/d1">1</a>"#).await;
    mount_page(&server, "/d1", r#"<a href="/d2">2</a>"#).await;
    mount_page(&server, "/d2", r#"<a href="/d3">3</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/d3"))
        .respond_with(html("too deep"))
        .expect(0)
        .mount(&server)
        .await;

    let report = create_crawler()
        .crawl(&format!("{}/", base), limits(10, 2))
        .await
        .unwrap();

    assert_eq!(
        urls(&report),
        vec![
            format!("{}/", base),
            format!("{}/d1", base),
            format!("{}/d2", base)
        ]
    );
}

#[tokio::test]
async fn test_other_hosts_not_followed() {
    let server = MockServer::start().await;
    let base = server.uri();
    let port = url::Url::parse(&base).unwrap().port().unwrap();

    mount_page(
        &server,
        "/",
        &format!(
            r#"<a href="http://localhost:{port}/x">Alias</a>
               <a href="https://example.org/">Elsewhere</a>
               <a href="mailto:someone@example.com">Mail</a>"#
        ),
    )
    .await;

    let report = create_crawler()
        .crawl(&format!("{}/", base), limits(10, 3))
        .await
        .unwrap();

    assert_eq!(urls(&report), vec![format!("{}/", base)]);
    assert!(report
        .pages
        .iter()
        .all(|page| page.url.starts_with("http://127.0.0.1:")));
}

#[tokio::test]
async fn test_http_errors_not_recorded() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        r#"<a href="/missing">Missing</a><a href="/broken">Broken</a><a href="/ok">OK</a>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_page(&server, "/ok", "ok").await;

    let observer = Arc::new(RecordingObserver::new());
    let report = create_crawler()
        .with_observer(observer.clone())
        .crawl(&format!("{}/", base), limits(10, 2))
        .await
        .unwrap();

    assert_eq!(urls(&report), vec![format!("{}/", base), format!("{}/ok", base)]);
    assert_eq!(report.stats.processed, 4);
    assert_eq!(report.stats.failed, 0);
    assert!(observer.failures().is_empty());
}

#[tokio::test]
async fn test_fetch_failures_reported_and_crawl_continues() {
    let server = MockServer::start().await;
    let base = server.uri();

    // Same host, closed port
    mount_page(
        &server,
        "/",
        r#"<a href="http://127.0.0.1:1/down">Down</a><a href="/up">Up</a>"#,
    )
    .await;
    mount_page(&server, "/up", "up").await;

    let observer = Arc::new(RecordingObserver::new());
    let report = create_crawler()
        .with_observer(observer.clone())
        .crawl(&format!("{}/", base), limits(10, 2))
        .await
        .unwrap();

    assert_eq!(urls(&report), vec![format!("{}/", base), format!("{}/up", base)]);
    assert_eq!(report.stats.failed, 1);

    let failures = observer.failures();
    assert_eq!(failures.len(), 1);
    match &failures[0] {
        CrawlEvent::FetchFailed { url, depth, .. } => {
            assert_eq!(url, "http://127.0.0.1:1/down");
            assert_eq!(*depth, 1);
        }
        other => panic!("unexpected event: {other:?}"),
    }

    let events = observer.events();
    assert!(matches!(events.first(), Some(CrawlEvent::Started { .. })));
    assert!(matches!(events.last(), Some(CrawlEvent::Finished { .. })));
}

#[tokio::test]
async fn test_last_modified_recorded() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            html("home").insert_header("last-modified", "Wed, 21 Oct 2015 07:28:00 GMT"),
        )
        .mount(&server)
        .await;

    let report = create_crawler()
        .crawl(&format!("{}/", base), limits(1, 0))
        .await
        .unwrap();

    assert_eq!(report.pages[0].last_modified.as_deref(), Some("2015-10-21"));
    assert_eq!(report.pages[0].status, 200);
}

#[tokio::test]
async fn test_stop_before_first_batch() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html("home"))
        .expect(0)
        .mount(&server)
        .await;

    let observer = Arc::new(RecordingObserver::new());
    let crawler = create_crawler().with_observer(observer.clone());
    crawler.stop_handle().stop();

    let report = crawler
        .crawl(&format!("{}/", base), limits(10, 2))
        .await
        .unwrap();

    assert!(report.stopped);
    assert!(report.pages.is_empty());
    assert!(observer
        .events()
        .iter()
        .any(|event| matches!(event, CrawlEvent::StopRequested { .. })));
}

#[tokio::test]
async fn test_stop_during_batch_finishes_in_flight_pages() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/child">Child</a>"#).set_delay(Duration::from_millis(300)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/child"))
        .respond_with(html("child"))
        .expect(0)
        .mount(&server)
        .await;

    let crawler = create_crawler();
    let stop = crawler.stop_handle();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        stop.stop();
    });

    let report = crawler
        .crawl(&format!("{}/", base), limits(10, 2))
        .await
        .unwrap();

    assert!(report.stopped);
    assert_eq!(urls(&report), vec![format!("{}/", base)]);
    assert_eq!(report.stats.processed, 1);
    assert_eq!(report.stats.queued, 1);
}

#[tokio::test]
async fn test_configured_delay_paces_requests() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", r#"<a href="/a">A</a><a href="/b">B</a>"#).await;
    mount_page(&server, "/a", "a").await;
    mount_page(&server, "/b", "b").await;

    let mut config = create_test_config(&format!("{}/", base), "unused");
    config.crawler.delay_ms = 100;

    let start = Instant::now();
    let report = crawler::crawl(&config).await.unwrap();

    // robots.txt plus three pages: three gaps of at least the delay
    assert!(start.elapsed() >= Duration::from_millis(300));
    assert_eq!(report.pages.len(), 3);
}

#[tokio::test]
async fn test_zero_request_budget_rejected() {
    let mut config = create_test_config("https://example.com/", "unused");
    config.crawler.max_requests_per_window = Some(0);

    let result = crawler::crawl(&config).await;
    assert!(matches!(
        result,
        Err(SitewaveError::Config(ConfigError::Validation(_)))
    ));
}

#[tokio::test]
async fn test_filter_excludes_links() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", r#"<a href="/docs/a">A</a><a href="/admin/x">X</a>"#).await;
    mount_page(&server, "/docs/a", "a").await;

    let mut config = create_test_config(&format!("{}/", base), "unused");
    config.filter.exclude = vec!["*/admin/*".to_string()];

    let report = crawler::crawl(&config).await.unwrap();
    assert_eq!(
        urls(&report),
        vec![format!("{}/", base), format!("{}/docs/a", base)]
    );
}

#[tokio::test]
async fn test_invalid_concurrency_rejected() {
    let mut config = create_test_config("https://example.com/", "unused");
    config.crawler.concurrency = 101;

    let result = crawler::crawl(&config).await;
    assert!(matches!(
        result,
        Err(SitewaveError::Config(ConfigError::Validation(_)))
    ));

    config.crawler.concurrency = 0;
    assert!(crawler::crawl(&config).await.is_err());
}

#[tokio::test]
async fn test_crawl_then_write_sitemaps() {
    let server = MockServer::start().await;
    let base = server.uri();
    let output = tempfile::TempDir::new().unwrap();

    mount_page(&server, "/", r#"<a href="/a">A</a><a href="/b">B</a>"#).await;
    mount_page(&server, "/a", "a").await;
    mount_page(&server, "/b", "b").await;

    let config = create_test_config(&format!("{}/", base), &output.path().to_string_lossy());
    let report = crawler::crawl(&config).await.unwrap();
    let files = sitewave::write_sitemaps(&report.pages, output.path(), 2, None).unwrap();

    assert_eq!(files.len(), 3);
    assert!(files[0].ends_with("sitemap-1.xml.gz"));
    assert!(files[1].ends_with("sitemap-2.xml.gz"));
    assert!(files[2].ends_with("sitemap-index.xml"));
}
