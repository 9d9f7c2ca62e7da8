use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use stream_resolver_lib::config::RelayConfig;
use stream_resolver_lib::relay::StreamRelay;
use stream_resolver_lib::resolver::{
    Backend, BackendError, BackendResult, ContentIdentifier, ResolutionEngine, ResolvedStream,
    SearchResult, ThreadRandom,
};
use stream_resolver_lib::server::{router, AppState};

/// Backend answering from fixed data; an empty catalog means every call is Empty
struct Catalog {
    name: &'static str,
    items: Vec<SearchResult>,
    broken: bool,
    calls: Arc<AtomicUsize>,
}

impl Catalog {
    fn new(name: &'static str, ids: &[&str]) -> Self {
        Self {
            name,
            items: ids.iter().map(|id| item(id)).collect(),
            broken: false,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn broken(name: &'static str) -> Self {
        Self {
            broken: true,
            ..Self::new(name, &[])
        }
    }
}

fn item(id: &str) -> SearchResult {
    SearchResult {
        identifier: ContentIdentifier::new(id),
        title: format!("Title {}", id),
        thumbnail: None,
        duration: Some(60),
        view_count: None,
        source_provider: String::new(),
    }
}

#[async_trait]
impl Backend for Catalog {
    fn name(&self) -> &str {
        self.name
    }

    async fn search(&self, _query: &str, limit: usize) -> BackendResult<Vec<SearchResult>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.broken {
            return BackendResult::Failure(BackendError::NetworkTimeout);
        }
        BackendResult::Success(self.items.iter().take(limit).cloned().collect()).non_empty()
    }

    async fn resolve_stream(&self, id: &ContentIdentifier) -> BackendResult<ResolvedStream> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.broken {
            return BackendResult::Failure(BackendError::Unavailable("gone".to_string()));
        }
        BackendResult::from_option(self.items.iter().find(|i| &i.identifier == id).map(|i| {
            ResolvedStream {
                stream_url: format!("https://cdn.example/{}.m4a", i.identifier),
                title: i.title.clone(),
                source_provider: String::new(),
            }
        }))
    }

    async fn resolve_related(&self, _id: &ContentIdentifier) -> BackendResult<SearchResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.broken {
            return BackendResult::Failure(BackendError::NetworkTimeout);
        }
        BackendResult::from_option(self.items.first().cloned())
    }
}

fn fallback() -> SearchResult {
    SearchResult {
        identifier: ContentIdentifier::new("fallbackId1"),
        title: "Fallback".to_string(),
        thumbnail: None,
        duration: None,
        view_count: None,
        source_provider: "fallback".to_string(),
    }
}

fn app(primary: Catalog, mirrors: Vec<Catalog>) -> Router {
    let engine = ResolutionEngine::new(
        Arc::new(primary),
        mirrors
            .into_iter()
            .map(|m| Arc::new(m) as Arc<dyn Backend>)
            .collect(),
        Arc::new(ThreadRandom),
        fallback(),
    );
    let relay = StreamRelay::new(&RelayConfig::default(), Arc::new(ThreadRandom)).unwrap();

    router(AppState {
        engine: Arc::new(engine),
        relay: Arc::new(relay),
        search_limit: 10,
    })
}

async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let (status, body) = get(app, uri).await;
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn health_reports_ok() {
    let (status, body) = get_json(app(Catalog::new("primary", &[]), vec![]), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!({ "status": "ok" }));
}

#[tokio::test]
async fn index_serves_html() {
    let response = app(Catalog::new("primary", &[]), vec![])
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("text/html"));
}

#[tokio::test]
async fn missing_parameters_are_bad_requests() {
    for uri in ["/api/search", "/api/search?q=", "/api/stream_url", "/api/related"] {
        let (status, body) = get_json(app(Catalog::new("primary", &[]), vec![]), uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert!(body["error"].is_string(), "{uri}");
    }

    let (status, body) = get(app(Catalog::new("primary", &[]), vec![]), "/api/proxy").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, b"Missing URL");
}

#[tokio::test]
async fn unrecognized_locator_is_bad_request() {
    let (status, _) = get_json(
        app(Catalog::new("primary", &["abc"]), vec![]),
        "/api/stream_url?url=https%3A%2F%2Fexample.com%2F",
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn proxy_rejects_non_http_targets() {
    let (status, _) = get(
        app(Catalog::new("primary", &[]), vec![]),
        "/api/proxy?url=file%3A%2F%2F%2Fetc%2Fpasswd",
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn search_returns_results_in_order_with_source() {
    let (status, body) = get_json(
        app(Catalog::new("primary", &["a1", "b2", "c3"]), vec![]),
        "/api/search?q=anything&limit=2",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let results = body.as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["id"], "a1");
    assert_eq!(results[1]["id"], "b2");
    assert_eq!(results[0]["source"], "primary");
    assert_eq!(results[0]["duration"], 60);
}

#[tokio::test]
async fn search_with_nothing_anywhere_is_not_found() {
    let (status, _) = get_json(
        app(Catalog::new("primary", &[]), vec![Catalog::new("mirror", &[])]),
        "/api/search?q=nothing",
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn search_with_failing_backends_is_server_error() {
    let (status, body) = get_json(
        app(Catalog::broken("primary"), vec![Catalog::broken("mirror")]),
        "/api/search?q=anything",
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("timeout"));
}

#[tokio::test]
async fn stream_url_falls_back_to_mirror() {
    let mirror = Catalog::new("mirror", &["abc"]);
    let mirror_calls = mirror.calls.clone();

    let (status, body) = get_json(
        app(Catalog::broken("primary"), vec![mirror]),
        "/api/stream_url?url=https%3A%2F%2Fwww.youtube.com%2Fwatch%3Fv%3Dabc",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stream_url"], "https://cdn.example/abc.m4a");
    assert_eq!(body["title"], "Title abc");
    assert_eq!(body["source"], "mirror");
    assert_eq!(mirror_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn stream_url_unresolved_is_server_error() {
    let (status, _) = get_json(
        app(Catalog::new("primary", &[]), vec![Catalog::broken("mirror")]),
        "/api/stream_url?url=https%3A%2F%2Fyoutu.be%2Fabc",
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn related_never_fails() {
    let (status, body) = get_json(
        app(Catalog::broken("primary"), vec![Catalog::broken("mirror")]),
        "/api/related?url=https%3A%2F%2Fyoutu.be%2Fabc",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!({ "id": "fallbackId1", "title": "Fallback" }));
}

#[tokio::test]
async fn related_from_primary() {
    let primary = Catalog::new("primary", &["next1"]);

    let (status, body) = get_json(app(primary, vec![]), "/api/related?url=https%3A%2F%2Fyoutu.be%2Fabc").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "next1");
}

#[tokio::test]
async fn cors_is_permissive() {
    let response = app(Catalog::new("primary", &[]), vec![])
        .oneshot(
            Request::builder()
                .uri("/health")
                .header(header::ORIGIN, "https://elsewhere.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}
