//! Integration tests for the harvester
//!
//! These tests use wiremock to serve robots.txt and sitemap documents and
//! exercise full harvests end-to-end over real HTTP.

use async_trait::async_trait;
use sitemap_harvest::config::{HarvesterConfig, UserAgentConfig};
use sitemap_harvest::harvester::{Fetch, FetchError, FetchedBody, HttpFetcher};
use sitemap_harvest::output::{count_errors, summarize, BudgetReason, ErrorKind};
use sitemap_harvest::{HarvestError, Harvester};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration with the given budgets
fn create_test_config(max_depth: usize, max_fanout: usize, max_sitemaps: usize) -> HarvesterConfig {
    HarvesterConfig {
        max_concurrent: 5,
        max_sitemaps,
        max_depth,
        max_fanout_per_level: max_fanout,
        timeout_seconds: 5.0,
    }
}

fn test_user_agent() -> UserAgentConfig {
    UserAgentConfig {
        crawler_name: "TestBot".to_string(),
        crawler_version: "1.0.0".to_string(),
        contact_url: "https://example.com/contact".to_string(),
    }
}

fn index_xml(children: &[String]) -> String {
    let entries: String = children
        .iter()
        .map(|c| format!("  <sitemap><loc>{}</loc></sitemap>\n", c))
        .collect();
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<sitemapindex xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n{}</sitemapindex>",
        entries
    )
}

fn urlset_xml(base: &str, prefix: &str, count: usize) -> String {
    let entries: String = (0..count)
        .map(|i| {
            format!(
                "  <url><loc>{}/{}/{}</loc><lastmod>2024-01-01</lastmod></url>\n",
                base, prefix, i
            )
        })
        .collect();
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n{}</urlset>",
        entries
    )
}

async fn mount_body(server: &MockServer, at: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

async fn mount_robots(server: &MockServer, declarations: &[String]) {
    let mut body = String::from("User-agent: *\nDisallow: /private\n");
    for declaration in declarations {
        body.push_str(&format!("Sitemap: {}\n", declaration));
    }
    mount_body(server, "/robots.txt", body).await;
}

#[tokio::test]
async fn test_end_to_end_index_with_three_children() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_robots(&server, &[format!("{}/sitemap_index.xml", base)]).await;
    let children: Vec<String> = ["a", "b", "c"]
        .iter()
        .map(|name| format!("{}/sitemap-{}.xml", base, name))
        .collect();
    mount_body(&server, "/sitemap_index.xml", index_xml(&children)).await;
    for name in ["a", "b", "c"] {
        mount_body(
            &server,
            &format!("/sitemap-{}.xml", name),
            urlset_xml(&base, name, 100),
        )
        .await;
    }

    let harvester =
        Harvester::new(create_test_config(2, 5, 10), &test_user_agent()).expect("valid config");
    let results = harvester.harvest_batch(&[base.clone()]).await;

    assert_eq!(results.len(), 1);
    let result = &results[0];
    assert_eq!(result.urls_found(), 300);
    assert!(result.errors.is_empty(), "errors: {:?}", result.errors);
    assert_eq!(result.sitemaps_fetched, 4);
    assert_eq!(result.total_requests, 5);
    assert!(!result.robots.as_ref().unwrap().used_fallback());
    assert!(result.contains_url(&format!("{}/b/42", base)));
    assert_eq!(
        result.urls[0].lastmod_datetime().map(|d| d.to_rfc3339()),
        Some("2024-01-01T00:00:00+00:00".to_string())
    );
}

#[tokio::test]
async fn test_fallback_without_sitemap_directive() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_robots(&server, &[]).await;
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(urlset_xml(&base, "p", 5)))
        .expect(1)
        .mount(&server)
        .await;

    let harvester = Harvester::new(create_test_config(2, 5, 10), &test_user_agent()).unwrap();
    let result = harvester.harvest_site(&base).await;

    assert_eq!(result.urls_found(), 5);
    assert!(result.robots.as_ref().unwrap().used_fallback());
}

#[tokio::test]
async fn test_missing_robots_falls_back_without_error() {
    let server = MockServer::start().await;
    let base = server.uri();

    // No robots.txt mock: wiremock answers 404
    mount_body(&server, "/sitemap.xml", urlset_xml(&base, "p", 3)).await;

    let harvester = Harvester::new(create_test_config(2, 5, 10), &test_user_agent()).unwrap();
    let result = harvester.harvest_site(&base).await;

    assert_eq!(result.urls_found(), 3);
    assert!(result.errors.is_empty());
}

#[tokio::test]
async fn test_missing_fallback_sitemap_is_total_failure() {
    let server = MockServer::start().await;
    let base = server.uri();

    let harvester = Harvester::new(create_test_config(2, 5, 10), &test_user_agent()).unwrap();
    let results = harvester.harvest_batch(&[base.clone()]).await;

    assert_eq!(results.len(), 1);
    assert!(results[0].is_total_failure());
    assert_eq!(results[0].errors[0].kind, ErrorKind::HttpStatus(404));
    assert_eq!(results[0].errors[0].url, format!("{}/sitemap.xml", base));
}

#[tokio::test]
async fn test_partial_failure_is_isolated() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_robots(&server, &[format!("{}/index.xml", base)]).await;
    let children: Vec<String> = (1..=3).map(|i| format!("{}/child{}.xml", base, i)).collect();
    mount_body(&server, "/index.xml", index_xml(&children)).await;
    mount_body(&server, "/child1.xml", urlset_xml(&base, "one", 10)).await;
    Mock::given(method("GET"))
        .and(path("/child2.xml"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_body(&server, "/child3.xml", urlset_xml(&base, "three", 10)).await;

    let harvester = Harvester::new(create_test_config(2, 5, 10), &test_user_agent()).unwrap();
    let result = harvester.harvest_site(&base).await;

    assert_eq!(result.urls_found(), 20);
    assert_eq!(result.errors.len(), 1);
    let error = &result.errors[0];
    assert_eq!(error.kind, ErrorKind::HttpStatus(500));
    assert_eq!(error.url, format!("{}/child2.xml", base));
    assert_eq!(error.depth, 1);
}

#[tokio::test]
async fn test_truncated_document_yields_parse_error() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_robots(
        &server,
        &[format!("{}/good.xml", base), format!("{}/truncated.xml", base)],
    )
    .await;
    mount_body(&server, "/good.xml", urlset_xml(&base, "good", 4)).await;
    let truncated: String = urlset_xml(&base, "bad", 4).chars().take(150).collect();
    mount_body(&server, "/truncated.xml", truncated).await;

    let harvester = Harvester::new(create_test_config(2, 5, 10), &test_user_agent()).unwrap();
    let result = harvester.harvest_site(&base).await;

    assert_eq!(result.urls_found(), 4);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].kind, ErrorKind::XmlParse);
    assert_eq!(result.errors[0].url, format!("{}/truncated.xml", base));
}

#[tokio::test]
async fn test_self_referencing_index_terminates() {
    let server = MockServer::start().await;
    let base = server.uri();

    let own_url = format!("{}/loop.xml", base);
    mount_robots(&server, &[own_url.clone()]).await;
    Mock::given(method("GET"))
        .and(path("/loop.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(index_xml(&[own_url])))
        .expect(1)
        .mount(&server)
        .await;

    let harvester = Harvester::new(create_test_config(5, 5, 10), &test_user_agent()).unwrap();
    let result = harvester.harvest_site(&base).await;

    assert_eq!(result.sitemaps_fetched, 1);
    assert!(result.errors.is_empty());
}

#[tokio::test]
async fn test_depth_budget_stops_expansion() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_robots(&server, &[format!("{}/level0.xml", base)]).await;
    mount_body(&server, "/level0.xml", index_xml(&[format!("{}/level1.xml", base)])).await;
    mount_body(&server, "/level1.xml", index_xml(&[format!("{}/level2.xml", base)])).await;
    Mock::given(method("GET"))
        .and(path("/level2.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(urlset_xml(&base, "deep", 3)))
        .expect(0)
        .mount(&server)
        .await;

    let harvester = Harvester::new(create_test_config(1, 5, 10), &test_user_agent()).unwrap();
    let result = harvester.harvest_site(&base).await;

    assert_eq!(result.urls_found(), 0);
    assert!(result.errors.is_empty());
    assert_eq!(result.notes.len(), 1);
    assert_eq!(result.notes[0].reason, BudgetReason::Depth);
}

#[tokio::test]
async fn test_fanout_and_sitemap_budgets() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_robots(&server, &[format!("{}/wide.xml", base)]).await;
    let children: Vec<String> = (0..8).map(|i| format!("{}/part{}.xml", base, i)).collect();
    mount_body(&server, "/wide.xml", index_xml(&children)).await;
    for i in 0..8 {
        mount_body(
            &server,
            &format!("/part{}.xml", i),
            urlset_xml(&base, &format!("part{}", i), 2),
        )
        .await;
    }

    // Fanout of 4 limits the index to its first four children
    let harvester = Harvester::new(create_test_config(2, 4, 50), &test_user_agent()).unwrap();
    let result = harvester.harvest_site(&base).await;
    assert_eq!(result.sitemaps_fetched, 5);
    assert_eq!(result.urls_found(), 8);
    assert!(result.contains_url(&format!("{}/part3/1", base)));
    assert!(!result.contains_url(&format!("{}/part4/0", base)));

    // A budget of 3 sitemaps allows the index and two children
    let harvester = Harvester::new(create_test_config(2, 8, 3), &test_user_agent()).unwrap();
    let result = harvester.harvest_site(&base).await;
    assert_eq!(result.sitemaps_fetched, 3);
    assert_eq!(result.urls_found(), 4);
    assert!(result
        .notes
        .iter()
        .any(|note| note.reason == BudgetReason::Sitemaps && note.skipped == 6));
}

#[tokio::test]
async fn test_dedup_across_branches() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_robots(
        &server,
        &[format!("{}/first.xml", base), format!("{}/second.xml", base)],
    )
    .await;
    mount_body(&server, "/first.xml", urlset_xml(&base, "shared", 5)).await;
    mount_body(&server, "/second.xml", urlset_xml(&base, "shared", 7)).await;

    let harvester = Harvester::new(create_test_config(2, 5, 10), &test_user_agent()).unwrap();
    let result = harvester.harvest_site(&base).await;

    assert_eq!(result.urls_found(), 7);
    let mut urls: Vec<&str> = result.urls.iter().map(|r| r.url.as_str()).collect();
    urls.dedup();
    assert_eq!(urls.len(), 7);
}

#[tokio::test]
async fn test_relative_references() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_body(&server, "/robots.txt", "Sitemap: /maps/index.xml\n".to_string()).await;
    mount_body(
        &server,
        "/maps/index.xml",
        "<sitemapindex><sitemap><loc>pages.xml</loc></sitemap></sitemapindex>".to_string(),
    )
    .await;
    mount_body(
        &server,
        "/maps/pages.xml",
        "<urlset><url><loc>/about</loc></url></urlset>".to_string(),
    )
    .await;

    let harvester = Harvester::new(create_test_config(2, 5, 10), &test_user_agent()).unwrap();
    let result = harvester.harvest_site(&base).await;

    assert!(result.errors.is_empty(), "errors: {:?}", result.errors);
    assert!(result.contains_url(&format!("{}/about", base)));
}

#[tokio::test]
async fn test_user_agent_header_is_sent() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .and(header("user-agent", "TestBot/1.0.0 (+https://example.com/contact)"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\n"))
        .expect(1)
        .mount(&server)
        .await;
    mount_body(&server, "/sitemap.xml", urlset_xml(&base, "p", 1)).await;

    let harvester = Harvester::new(create_test_config(2, 5, 10), &test_user_agent()).unwrap();
    let result = harvester.harvest_site(&base).await;

    assert_eq!(result.urls_found(), 1);
}

#[tokio::test]
async fn test_timeout_is_recorded() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_robots(&server, &[format!("{}/slow.xml", base)]).await;
    Mock::given(method("GET"))
        .and(path("/slow.xml"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(urlset_xml(&base, "slow", 1))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let config = HarvesterConfig {
        timeout_seconds: 0.3,
        ..create_test_config(2, 5, 10)
    };
    let harvester = Harvester::new(config, &test_user_agent()).unwrap();
    let result = harvester.harvest_site(&base).await;

    assert!(result.is_total_failure());
    assert_eq!(result.errors[0].kind, ErrorKind::Timeout);
    assert_eq!(harvester.governor().in_flight(), 0);
}

#[tokio::test]
async fn test_invalid_config_fails_before_any_fetch() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    for config in [
        HarvesterConfig {
            max_concurrent: 0,
            ..create_test_config(2, 5, 10)
        },
        create_test_config(2, 0, 10),
        create_test_config(2, 5, 0),
        HarvesterConfig {
            timeout_seconds: 0.0,
            ..create_test_config(2, 5, 10)
        },
    ] {
        let result = Harvester::new(config, &test_user_agent());
        assert!(matches!(result, Err(HarvestError::Config(_))));
    }
}

/// Wraps the HTTP fetcher and records peak concurrent calls
struct InstrumentedFetcher {
    inner: HttpFetcher,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

#[async_trait]
impl Fetch for InstrumentedFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedBody, FetchError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        let result = self.inner.fetch(url).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

#[tokio::test]
async fn test_concurrency_bound_across_batch() {
    let mut servers = Vec::new();
    for _ in 0..4 {
        let server = MockServer::start().await;
        let base = server.uri();
        let children: Vec<String> = (0..5).map(|i| format!("{}/s{}.xml", base, i)).collect();
        mount_robots(&server, &[format!("{}/index.xml", base)]).await;
        mount_body(&server, "/index.xml", index_xml(&children)).await;
        for i in 0..5 {
            Mock::given(method("GET"))
                .and(path(format!("/s{}.xml", i)))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_string(urlset_xml(&base, &format!("s{}", i), 3))
                        .set_delay(Duration::from_millis(50)),
                )
                .mount(&server)
                .await;
        }
        servers.push(server);
    }

    let config = HarvesterConfig {
        max_concurrent: 3,
        ..create_test_config(2, 5, 10)
    };
    let fetcher = Arc::new(InstrumentedFetcher {
        inner: HttpFetcher::from_config(&test_user_agent(), config.timeout()).unwrap(),
        in_flight: AtomicUsize::new(0),
        peak: AtomicUsize::new(0),
    });
    let harvester = Harvester::with_fetcher(config, fetcher.clone()).unwrap();

    let sites: Vec<String> = servers.iter().map(|s| s.uri()).collect();
    let results = harvester.harvest_batch(&sites).await;

    assert_eq!(results.len(), 4);
    for (site, result) in sites.iter().zip(&results) {
        assert_eq!(&result.base_url, site);
        assert_eq!(result.urls_found(), 15);
    }
    assert!(fetcher.peak.load(Ordering::SeqCst) <= 3);
    assert!(harvester.governor().peak_in_flight() <= 3);

    let stats = summarize(&results);
    assert_eq!(stats.total_urls, 60);
    assert_eq!(stats.total_sitemaps, 24);
    assert_eq!(count_errors(&results, ErrorKind::Timeout), 0);
}

#[tokio::test]
async fn test_cancellation_releases_all_slots() {
    let server = MockServer::start().await;
    let base = server.uri();

    let children: Vec<String> = (0..4).map(|i| format!("{}/hang{}.xml", base, i)).collect();
    mount_robots(&server, &[format!("{}/index.xml", base)]).await;
    mount_body(&server, "/index.xml", index_xml(&children)).await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(10)))
        .mount(&server)
        .await;

    let harvester = Harvester::new(create_test_config(2, 5, 10), &test_user_agent()).unwrap();

    // An external batch deadline layered on top of the harvest
    let outcome = tokio::time::timeout(
        Duration::from_millis(300),
        harvester.harvest_batch(&[base.clone()]),
    )
    .await;
    assert!(outcome.is_err());

    // Aborted tasks release their slots as the runtime drops them
    let governor = harvester.governor();
    for _ in 0..100 {
        if governor.in_flight() == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(governor.in_flight(), 0);
    assert_eq!(governor.available(), governor.capacity());
}
