use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{self, Request, StatusCode};
use tower::ServiceExt;
use url::Url;

use spider_registry::{FetchError, Fetcher, Page, RuleRegistry, TestRunner};
use spider_server::api::AppState;
use spider_store::{RuleStore, StoreError, StoredRule};
use spider_store_memory::MemoryRuleStore;

// -- Stub fetcher ---------------------------------------------------------

const PAGE: &str = r#"<html><body>
    <a class="story" href="/news/1">One</a>
    <a class="story" href="/news/2#comments">Two</a>
    <a href="https://other.example.org/x">Elsewhere</a>
</body></html>"#;

/// Serves `PAGE` for every URL except hosts named `down.example`, which fail
/// with a 503.
#[derive(Default)]
struct StubFetcher {
    calls: AtomicUsize,
}

#[async_trait]
impl Fetcher for StubFetcher {
    async fn fetch(&self, url: &Url) -> Result<Page, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if url.host_str() == Some("down.example") {
            return Err(FetchError::Status(503));
        }
        Ok(Page {
            url: url.clone(),
            status: 200,
            body: PAGE.to_owned(),
        })
    }
}

// -- Unreachable store ----------------------------------------------------

struct DownStore;

fn refused() -> StoreError {
    StoreError::Connection("connection refused".into())
}

#[async_trait]
impl RuleStore for DownStore {
    async fn list(&self) -> Result<Vec<StoredRule>, StoreError> {
        Err(refused())
    }
    async fn get(&self, _id: u64) -> Result<Option<StoredRule>, StoreError> {
        Err(refused())
    }
    async fn create(&self, _host: &str, _json: &str) -> Result<u64, StoreError> {
        Err(refused())
    }
    async fn update(&self, _id: u64, _host: &str, _json: &str) -> Result<bool, StoreError> {
        Err(refused())
    }
    async fn delete(&self, _id: u64) -> Result<bool, StoreError> {
        Err(refused())
    }
    async fn ping(&self) -> Result<(), StoreError> {
        Err(refused())
    }
}

fn app_with_store(store: Arc<dyn RuleStore>) -> axum::Router {
    let fetcher: Arc<dyn Fetcher> = Arc::new(StubFetcher::default());
    spider_server::api::router(AppState {
        registry: Arc::new(RuleRegistry::new(store)),
        runner: Arc::new(TestRunner::new(fetcher)),
    })
}

// -- Helpers --------------------------------------------------------------

struct Harness {
    app: axum::Router,
    store: Arc<MemoryRuleStore>,
    fetcher: Arc<StubFetcher>,
}

fn harness() -> Harness {
    let store = Arc::new(MemoryRuleStore::new());
    let fetcher = Arc::new(StubFetcher::default());

    let state = AppState {
        registry: Arc::new(RuleRegistry::new(Arc::clone(&store) as Arc<dyn RuleStore>)),
        runner: Arc::new(TestRunner::new(Arc::clone(&fetcher) as Arc<dyn Fetcher>)),
    };

    Harness {
        app: spider_server::api::router(state),
        store,
        fetcher,
    }
}

const RULE: &str = r#"{"start":"https://example.com/","links":["a.story"]}"#;

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

async fn get(app: &axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    send(
        app,
        Request::builder().uri(uri).body(Body::empty()).unwrap(),
    )
    .await
}

async fn post_form(
    app: &axum::Router,
    uri: &str,
    fields: &[(&str, &str)],
) -> (StatusCode, serde_json::Value) {
    let body = serde_urlencoded::to_string(fields).unwrap();
    send(
        app,
        Request::builder()
            .method(http::Method::POST)
            .uri(uri)
            .header(
                http::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .body(Body::from(body))
            .unwrap(),
    )
    .await
}

async fn create(app: &axum::Router, host: &str, json: &str) -> u64 {
    let (status, body) = post_form(
        app,
        "/spider/rule/create",
        &[("host", host), ("json", json)],
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["Success"], true);
    body["Response"]["Id"].as_u64().unwrap()
}

// -- Health & docs --------------------------------------------------------

#[tokio::test]
async fn health_returns_200() {
    let h = harness();
    let (status, body) = get(&h.app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["store"], "ok");
}

#[tokio::test]
async fn openapi_document_is_served() {
    let h = harness();
    let (status, body) = get(&h.app, "/api-doc/openapi.json").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/spider/rule/create"].is_object());
}

// -- CRUD -----------------------------------------------------------------

#[tokio::test]
async fn create_then_get() {
    let h = harness();
    let id = create(&h.app, "example.com", RULE).await;

    let (status, body) = get(&h.app, &format!("/spider/rule/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["Success"], true);
    assert!(body["Error"].is_null());

    let record = &body["Response"];
    assert_eq!(record["Id"], id);
    assert_eq!(record["Host"], "example.com");
    assert_eq!(record["Rule"]["start"], "https://example.com/");
    assert_eq!(record["Rule"]["links"][0], "a.story");
    assert!(record["RuleStr"].as_str().unwrap().contains("\t\"start\""));
    assert!(record["LastUpdate"].is_string());
}

#[tokio::test]
async fn create_rejects_malformed_document() {
    let h = harness();
    let (status, body) = post_form(
        &h.app,
        "/spider/rule/create",
        &[("host", "example.com"), ("json", "{not json")],
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["Success"], false);
    assert!(
        body["Error"]
            .as_str()
            .unwrap()
            .starts_with("invalid rule document")
    );
    assert!(body["Response"].is_null());
    assert!(h.store.is_empty());
}

#[tokio::test]
async fn create_rejects_missing_fields() {
    let h = harness();
    let (status, body) = post_form(&h.app, "/spider/rule/create", &[("host", "a.com")]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["Success"], false);
    assert!(h.store.is_empty());
}

#[tokio::test]
async fn list_orders_by_host_then_id() {
    let h = harness();
    let b = create(&h.app, "b.com", RULE).await;
    let a1 = create(&h.app, "a.com", RULE).await;
    let a2 = create(&h.app, "a.com", RULE).await;

    let (status, body) = get(&h.app, "/spider/rule/all").await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<u64> = body["Response"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["Id"].as_u64().unwrap())
        .collect();
    assert_eq!(ids, vec![a1, a2, b]);
}

#[tokio::test]
async fn list_empty_store() {
    let h = harness();
    let (status, body) = get(&h.app, "/spider/rule/all").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["Response"], serde_json::json!([]));
}

#[tokio::test]
async fn update_replaces_rule() {
    let h = harness();
    let id = create(&h.app, "old.com", RULE).await;
    let id_field = id.to_string();

    let (status, body) = post_form(
        &h.app,
        "/spider/rule/update",
        &[
            ("id", id_field.as_str()),
            ("host", "new.com"),
            ("json", r#"{"start":"https://new.com/"}"#),
        ],
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["Response"]["Matched"], true);

    let (_, body) = get(&h.app, &format!("/spider/rule/{id}")).await;
    assert_eq!(body["Response"]["Host"], "new.com");
    assert_eq!(body["Response"]["Rule"]["start"], "https://new.com/");
}

#[tokio::test]
async fn update_unknown_id_reports_success() {
    let h = harness();
    let (status, body) = post_form(
        &h.app,
        "/spider/rule/update",
        &[("id", "77"), ("host", "ghost.com"), ("json", RULE)],
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["Success"], true);
    assert_eq!(body["Response"]["Matched"], false);
    assert!(h.store.is_empty());
}

#[tokio::test]
async fn update_rejects_bad_id_and_document() {
    let h = harness();
    let id = create(&h.app, "a.com", RULE).await;
    let id_field = id.to_string();

    let (status, body) = post_form(
        &h.app,
        "/spider/rule/update",
        &[("id", "seven"), ("host", "a.com"), ("json", RULE)],
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["Success"], false);

    let (status, _) = post_form(
        &h.app,
        "/spider/rule/update",
        &[("id", id_field.as_str()), ("host", "b.com"), ("json", "[]")],
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = get(&h.app, &format!("/spider/rule/{id}")).await;
    assert_eq!(body["Response"]["Host"], "a.com");
}

#[tokio::test]
async fn delete_is_idempotent() {
    let h = harness();
    let id = create(&h.app, "a.com", RULE).await;

    for _ in 0..2 {
        let (status, body) = get(&h.app, &format!("/spider/rule/delete/{id}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["Success"], true);
        assert!(body["Response"].is_null());
    }

    let (status, body) = get(&h.app, &format!("/spider/rule/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["Success"], false);
    assert_eq!(body["Error"], format!("rule not found: {id}"));
}

#[tokio::test]
async fn non_numeric_ids_are_not_found() {
    let h = harness();
    for uri in ["/spider/rule/abc", "/spider/rule/-1", "/spider/rule/delete/x1"] {
        let (status, body) = get(&h.app, uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body["Success"], false);
    }
}

// -- Test runs ------------------------------------------------------------

#[tokio::test]
async fn test_run_returns_links_without_persisting() {
    let h = harness();
    let (status, body) = post_form(&h.app, "/spider/rule/test", &[("json", RULE)]).await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["Success"], true);
    assert_eq!(
        body["Response"],
        serde_json::json!(["https://example.com/news/1", "https://example.com/news/2"])
    );
    assert_eq!(h.fetcher.calls.load(Ordering::SeqCst), 1);

    let (_, body) = get(&h.app, "/spider/rule/all").await;
    assert_eq!(body["Response"], serde_json::json!([]));
}

#[tokio::test]
async fn test_run_with_start_override() {
    let h = harness();
    let (status, body) = post_form(
        &h.app,
        "/spider/rule/test",
        &[("json", RULE), ("start", "https://mirror.example.net/")],
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["Response"][0], "https://mirror.example.net/news/1");
}

#[tokio::test]
async fn test_run_malformed_document_never_fetches() {
    let h = harness();
    let (status, body) = post_form(&h.app, "/spider/rule/test", &[("json", "nope")]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["Success"], false);
    assert_eq!(h.fetcher.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_run_invalid_start_url() {
    let h = harness();
    let (status, body) = post_form(
        &h.app,
        "/spider/rule/test",
        &[("json", r#"{"start":"::not a url::"}"#)],
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["Error"].as_str().unwrap().contains("invalid start URL"));
    assert_eq!(h.fetcher.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_run_fetch_failure() {
    let h = harness();
    let (status, body) = post_form(
        &h.app,
        "/spider/rule/test",
        &[("json", r#"{"start":"https://down.example/"}"#)],
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["Success"], false);
    assert_eq!(body["Error"], "fetch failed: unexpected HTTP status 503");
    assert_eq!(h.fetcher.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_run_extraction_failure() {
    let h = harness();
    let (status, body) = post_form(
        &h.app,
        "/spider/rule/test",
        &[("json", r#"{"start":"https://example.com/","links":["a[href"]}"#)],
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["Success"], false);
}

// -- Validation -----------------------------------------------------------

#[tokio::test]
async fn validate_reports_verdict_in_envelope() {
    let h = harness();

    let (status, body) = post_form(&h.app, "/spider/rule/validate", &[("json", RULE)]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["Success"], true);
    assert_eq!(body["Response"]["start"], "https://example.com/");

    let (status, body) = post_form(
        &h.app,
        "/spider/rule/validate",
        &[("json", r#"{"start": 5}"#)],
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["Success"], false);
    assert!(body["Error"].as_str().unwrap().contains("invalid type"));

    let (status, body) = post_form(&h.app, "/spider/rule/validate", &[]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["Success"], false);

    assert!(h.store.is_empty());
    assert_eq!(h.fetcher.calls.load(Ordering::SeqCst), 0);
}

// -- Operational failures -------------------------------------------------

#[tokio::test]
async fn corrupt_row_is_server_error() {
    let h = harness();
    create(&h.app, "good.com", RULE).await;
    let id = h.store.create("broken.com", "{\"links\":").await.unwrap();

    let (status, body) = get(&h.app, &format!("/spider/rule/{id}")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["Success"], false);
    assert!(body["Error"].as_str().unwrap().contains(&format!("rule {id} is corrupt")));
    assert!(body["Response"].is_null());

    let (status, body) = get(&h.app, "/spider/rule/all").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["Success"], false);
}

#[tokio::test]
async fn unreachable_store_is_server_error() {
    let app = app_with_store(Arc::new(DownStore));

    let (status, body) = post_form(
        &app,
        "/spider/rule/create",
        &[("host", "a.com"), ("json", RULE)],
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["Success"], false);
    assert_eq!(
        body["Error"],
        "store unavailable: connection error: connection refused"
    );

    let (status, body) = post_form(
        &app,
        "/spider/rule/update",
        &[("id", "1"), ("host", "a.com"), ("json", RULE)],
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["Success"], false);

    for uri in ["/spider/rule/delete/1", "/spider/rule/1", "/spider/rule/all"] {
        let (status, body) = get(&app, uri).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{uri}");
        assert_eq!(body["Success"], false);
    }

    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "degraded");
}

#[tokio::test]
async fn malformed_document_short_circuits_before_store() {
    let app = app_with_store(Arc::new(DownStore));
    let (status, body) = post_form(
        &app,
        "/spider/rule/create",
        &[("host", "a.com"), ("json", "{oops")],
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["Success"], false);
}

// -- Unmatched routes -----------------------------------------------------

#[tokio::test]
async fn unknown_paths_get_an_envelope() {
    let h = harness();
    for uri in ["/spider/rule/1/x", "/spider/nothing", "/"] {
        let (status, body) = get(&h.app, uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body["Success"], false);
        assert!(body["Error"].as_str().unwrap().contains("no route"));
    }
}

#[tokio::test]
async fn wrong_method_gets_an_envelope() {
    let h = harness();
    let (status, body) = get(&h.app, "/spider/rule/create").await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["Success"], false);
    assert!(body["Error"].as_str().unwrap().contains("GET"));

    let (status, body) = post_form(&h.app, "/spider/rule/all", &[]).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["Success"], false);
}
