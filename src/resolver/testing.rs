// Test doubles shared by the resolver unit tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use super::models::{BackendResult, ContentIdentifier, ResolvedStream, SearchResult};
use super::traits::{Backend, RandomSource};

/// Always picks the same index, clamped to the slice
pub struct FixedRandom(pub usize);

impl RandomSource for FixedRandom {
    fn pick_index(&self, len: usize) -> usize {
        self.0.min(len.saturating_sub(1))
    }
}

/// Backend that answers every call with a canned outcome and counts calls
pub struct ScriptedBackend {
    name: String,
    search: BackendResult<Vec<SearchResult>>,
    stream: BackendResult<ResolvedStream>,
    related: BackendResult<SearchResult>,
    pub calls: Arc<AtomicUsize>,
}

impl ScriptedBackend {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            search: BackendResult::Empty,
            stream: BackendResult::Empty,
            related: BackendResult::Empty,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_search(mut self, result: BackendResult<Vec<SearchResult>>) -> Self {
        self.search = result;
        self
    }

    pub fn with_stream(mut self, result: BackendResult<ResolvedStream>) -> Self {
        self.stream = result;
        self
    }

    pub fn with_related(mut self, result: BackendResult<SearchResult>) -> Self {
        self.related = result;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, _query: &str, _limit: usize) -> BackendResult<Vec<SearchResult>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.search.clone()
    }

    async fn resolve_stream(&self, _id: &ContentIdentifier) -> BackendResult<ResolvedStream> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.stream.clone()
    }

    async fn resolve_related(&self, _id: &ContentIdentifier) -> BackendResult<SearchResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.related.clone()
    }
}

pub fn item(id: &str, title: &str) -> SearchResult {
    SearchResult {
        identifier: ContentIdentifier::new(id),
        title: title.to_string(),
        thumbnail: None,
        duration: None,
        view_count: None,
        source_provider: String::new(),
    }
}

/// Serve `router` on an ephemeral local port, returning its base URL
pub async fn spawn_server(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}
