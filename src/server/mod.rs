// HTTP surface
//
// Routes:
// - GET /api/search      free-text search
// - GET /api/stream_url  resolve a page URL into a playable stream URL
// - GET /api/related     one related item, never fails
// - GET /api/proxy       relay the bytes of a stream URL
// - GET /health
// - GET /                static entry page

mod errors;
mod handlers;

use std::sync::Arc;

use anyhow::Context;
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::relay::StreamRelay;
use crate::resolver::backends::{MirrorBackend, YtDlpBackend};
use crate::resolver::errors::BackendError;
use crate::resolver::extractors::InfoExtractorOrchestrator;
use crate::resolver::{Backend, RandomSource, ResolutionEngine, ThreadRandom};

pub use errors::ApiError;

/// Shared, read-only request state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ResolutionEngine>,
    pub relay: Arc<StreamRelay>,
    /// Used when a search request carries no `limit`
    pub search_limit: usize,
}

impl AppState {
    /// Wire the production backends and relay from configuration
    pub fn from_config(config: &AppConfig) -> Result<Self, BackendError> {
        let random: Arc<dyn RandomSource> = Arc::new(ThreadRandom);

        let primary: Arc<dyn Backend> = Arc::new(YtDlpBackend::new(
            InfoExtractorOrchestrator::new(),
            config.extractor.clone(),
            config.format_preferences.clone(),
            random.clone(),
        ));

        let mut mirror_client = reqwest::Client::builder().timeout(config.mirrors.timeout);
        if let Some(proxy) = &config.mirrors.proxy {
            mirror_client = mirror_client.proxy(reqwest::Proxy::all(proxy)?);
        }
        let mirror_client = mirror_client.build()?;

        let secondaries: Vec<Arc<dyn Backend>> = config
            .mirrors
            .base_urls
            .iter()
            .map(|base| {
                Arc::new(MirrorBackend::new(base, mirror_client.clone(), random.clone()))
                    as Arc<dyn Backend>
            })
            .collect();

        let engine = ResolutionEngine::new(
            primary,
            secondaries,
            random.clone(),
            config.fallback_related.clone(),
        );
        let relay = StreamRelay::new(&config.relay, random)?;

        Ok(Self {
            engine: Arc::new(engine),
            relay: Arc::new(relay),
            search_limit: config.search_limit,
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/api/search", get(handlers::search))
        .route("/api/stream_url", get(handlers::stream_url))
        .route("/api/related", get(handlers::related))
        .route("/api/proxy", get(handlers::proxy))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until Ctrl-C
pub async fn run_server(config: AppConfig) -> anyhow::Result<()> {
    let state = AppState::from_config(&config).context("failed to build backends")?;
    tracing::info!(backends = ?state.engine.backend_names(), "resolution engine ready");

    let app = router(state);
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    tracing::info!(addr = %config.bind, "stream resolver listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
