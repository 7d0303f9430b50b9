//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end: session check, sitemap frontier,
//! fetching, extraction, flattening and checkpointing.

use larder::config::{Config, CrawlerConfig, OutputConfig, SessionConfig};
use larder::crawler::crawl;
use larder::session::{
    BrowserContext, BrowserCookie, HttpSessionProvider, SessionError, SessionProvider,
};
use larder::storage::{CheckpointStore, DirectoryStore};
use larder::LarderError;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HOME: &str = "<html><head><title>Yummly: Personalized Recipe Recommendations</title></head>\
                    <body></body></html>";
const CHALLENGE: &str = "<html><head><title>Just a moment...</title></head><body></body></html>";

/// Creates a test configuration pointing at the mock server
fn create_test_config(base_url: &str, output: &Path) -> Config {
    Config {
        crawler: CrawlerConfig {
            max_concurrent_requests: 3,
            checkpoint_interval_secs: 1,
            max_retries: 3,
            retry_base_delay_ms: 0, // No backoff wait in tests
            retry_backoff_factor: 3,
            request_timeout_secs: 5,
            blocking_threads: 2,
        },
        session: SessionConfig {
            base_url: base_url.to_string(),
            site_marker: "yummly".to_string(),
            user_agent: Some("LarderTest/1.0".to_string()),
            cookies_file: None,
        },
        output: OutputConfig {
            directory: output.to_path_buf(),
            sitemap_directory: None,
        },
    }
}

/// Writes a plain-text sitemap listing `paths` on the mock server
fn write_sitemap(config: &Config, base_url: &str, paths: &[&str]) {
    let dir = config.output.sitemap_dir();
    fs::create_dir_all(&dir).unwrap();
    let content: Vec<String> = paths.iter().map(|p| format!("{}{}", base_url, p)).collect();
    fs::write(dir.join("recipes.txt"), content.join("\n")).unwrap();
}

/// Renders a recipe page embedding `state` the way the site does
fn recipe_html(title: &str, state: &Value) -> String {
    let encoded = utf8_percent_encode(&state.to_string(), NON_ALPHANUMERIC).to_string();
    format!(
        r#"<html><head><title>{}</title></head><body>
        <div id="app"></div>
        <script>window.__INITIAL_STATE__ = "{}";</script>
        </body></html>"#,
        title, encoded
    )
}

/// State of the lemon bars page, with one related recipe
fn lemon_bars_state(base_url: &str) -> Value {
    json!({
        "recipe": {
            "id": "Lemon-Bars-1",
            "name": "Lemon Bars",
            "share": {"url": format!("{}/recipe/Lemon-Bars-1", base_url)},
            "moreFromSource": [{
                "id": "Key-Lime-Pie-2",
                "recipeInfo": {
                    "recipe": {
                        "id": "Key-Lime-Pie-2",
                        "name": "Key Lime Pie",
                        "share": {"url": format!("{}/recipe/Key-Lime-Pie-2", base_url)}
                    },
                    "yums": {"count": 3}
                }
            }],
            "moreFromSourceLoaded": true,
            "moreFromSourceLoading": false
        },
        "yums": {"count": 41}
    })
}

async fn mount_home(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(HOME))
        .mount(server)
        .await;
}

async fn new_session(config: &Config) -> Arc<dyn larder::session::Session> {
    let context = BrowserContext::from_config(&config.session).expect("Invalid session config");
    HttpSessionProvider::from_config(config)
        .new_session(&context)
        .await
        .expect("Session check failed")
}

fn read_record(store: &DirectoryStore, id: &str) -> Value {
    let content = fs::read_to_string(store.record_path(id)).expect("Record file missing");
    serde_json::from_str(&content).expect("Record is not JSON")
}

#[tokio::test]
async fn test_full_crawl_writes_recipes() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let output = TempDir::new().unwrap();
    let config = create_test_config(&base_url, output.path());
    write_sitemap(&config, &base_url, &["/recipe/Lemon-Bars-1", "/recipe/Gone-3"]);

    mount_home(&server).await;
    Mock::given(method("GET"))
        .and(path("/recipe/Lemon-Bars-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(recipe_html(
            "Lemon Bars Recipe | Yummly",
            &lemon_bars_state(&base_url),
        )))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/recipe/Gone-3"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1) // Not found is never retried
        .mount(&server)
        .await;

    let session = new_session(&config).await;
    let summary = crawl(config, session, false).await.expect("Crawl failed");

    assert_eq!(summary.processed, 2);
    assert_eq!(summary.records_written, 2);
    assert_eq!(summary.failed, 1);

    let store = DirectoryStore::open_existing(output.path());
    let checkpoint = store.load_checkpoint().unwrap();
    assert!(checkpoint
        .scraped
        .contains(&format!("{}/recipe/Lemon-Bars-1", base_url)));
    assert!(checkpoint
        .scraped
        .contains(&format!("{}/recipe/Key-Lime-Pie-2", base_url)));
    assert_eq!(checkpoint.failed.len(), 1);
    assert!(checkpoint
        .failed
        .contains(&format!("{}/recipe/Gone-3", base_url)));
    assert_eq!(store.count_records().unwrap(), 2);

    let lemon = read_record(&store, "Lemon-Bars-1");
    assert_eq!(lemon["name"], "Lemon Bars");
    assert_eq!(lemon["yums"], json!({"count": 41}));
    assert!(lemon.get("moreFromSource").is_none());
    assert!(lemon.get("moreFromSourceLoaded").is_none());

    let pie = read_record(&store, "Key-Lime-Pie-2");
    assert_eq!(pie["name"], "Key Lime Pie");
    assert_eq!(pie["yums"], json!({"count": 3}));
}

#[tokio::test]
async fn test_resumed_crawl_skips_checkpointed_urls() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let output = TempDir::new().unwrap();
    let config = create_test_config(&base_url, output.path());
    write_sitemap(
        &config,
        &base_url,
        &["/recipe/Lemon-Bars-1", "/recipe/Gone-3", "/recipe/Key-Lime-Pie-2"],
    );

    mount_home(&server).await;
    Mock::given(method("GET"))
        .and(path("/recipe/Lemon-Bars-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(recipe_html(
            "Lemon Bars Recipe | Yummly",
            &lemon_bars_state(&base_url),
        )))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/recipe/Gone-3"))
        .respond_with(ResponseTemplate::new(410))
        .expect(1)
        .mount(&server)
        .await;

    // With one request in flight, the related recipe is registered before
    // its own frontier entry comes up
    let mut first = config.clone();
    first.crawler.max_concurrent_requests = 1;
    let session = new_session(&first).await;
    let summary = crawl(first, session, false).await.expect("First crawl failed");
    assert_eq!(summary.processed, 2);
    assert_eq!(summary.skipped, 1);

    let session = new_session(&config).await;
    let summary = crawl(config, session, false).await.expect("Second crawl failed");
    assert_eq!(summary.processed, 0);
    assert_eq!(summary.skipped, 3);
    assert_eq!(summary.scraped_total, 2);
    assert_eq!(summary.failed_total, 1);
}

#[tokio::test]
async fn test_transient_errors_are_retried() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let output = TempDir::new().unwrap();
    let config = create_test_config(&base_url, output.path());
    write_sitemap(&config, &base_url, &["/recipe/Lemon-Bars-1"]);

    mount_home(&server).await;
    Mock::given(method("GET"))
        .and(path("/recipe/Lemon-Bars-1"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/recipe/Lemon-Bars-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(recipe_html(
            "Lemon Bars Recipe | Yummly",
            &lemon_bars_state(&base_url),
        )))
        .expect(1)
        .mount(&server)
        .await;

    let session = new_session(&config).await;
    let summary = crawl(config, session, false).await.expect("Crawl failed");

    assert_eq!(summary.records_written, 2);
    assert_eq!(summary.failed, 0);
}

#[tokio::test]
async fn test_exhausted_retries_mark_page_failed() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let output = TempDir::new().unwrap();
    let mut config = create_test_config(&base_url, output.path());
    config.crawler.max_retries = 2;
    write_sitemap(&config, &base_url, &["/recipe/Lemon-Bars-1"]);

    mount_home(&server).await;
    Mock::given(method("GET"))
        .and(path("/recipe/Lemon-Bars-1"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3) // First attempt plus two retries
        .mount(&server)
        .await;

    let session = new_session(&config).await;
    let summary = crawl(config, session, false).await.expect("Crawl failed");

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.failed_total, 1);
    assert_eq!(summary.records_written, 0);
}

#[tokio::test]
async fn test_access_challenge_stops_crawl() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let output = TempDir::new().unwrap();
    let config = create_test_config(&base_url, output.path());
    write_sitemap(&config, &base_url, &["/recipe/Lemon-Bars-1"]);

    mount_home(&server).await;
    Mock::given(method("GET"))
        .and(path("/recipe/Lemon-Bars-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CHALLENGE))
        .mount(&server)
        .await;

    let session = new_session(&config).await;
    let result = crawl(config, session, false).await;

    match result {
        Err(LarderError::AccessChallenge { url, title }) => {
            assert_eq!(url, format!("{}/recipe/Lemon-Bars-1", base_url));
            assert_eq!(title, "Just a moment...");
        }
        other => panic!("expected an access challenge, got {:?}", other),
    }

    // The challenged page is neither scraped nor failed, so a resumed run retries it
    let checkpoint = DirectoryStore::open_existing(output.path())
        .load_checkpoint()
        .unwrap();
    assert!(checkpoint.is_empty());
}

#[tokio::test]
async fn test_session_check_detects_challenge() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), output.path());

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CHALLENGE))
        .mount(&server)
        .await;

    let context = BrowserContext::from_config(&config.session).unwrap();
    let result = HttpSessionProvider::from_config(&config)
        .new_session(&context)
        .await;

    assert!(matches!(result, Err(SessionError::AccessChallenge { .. })));
}

#[tokio::test]
async fn test_session_presents_browser_identity() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), output.path());

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("cookie", "cf_clearance=abc123"))
        .and(header("user-agent", "LarderTest/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_string(HOME))
        .expect(1)
        .mount(&server)
        .await;

    let context = BrowserContext::from_config(&config.session)
        .unwrap()
        .with_cookie(BrowserCookie::new("cf_clearance", "abc123"));
    let result = HttpSessionProvider::from_config(&config)
        .new_session(&context)
        .await;

    assert!(result.is_ok());
}
