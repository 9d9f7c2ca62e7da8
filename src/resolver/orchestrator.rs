// Resolution engine with single-level fallback
//
// Every operation follows the same two tiers:
// 1. Primary backend
// 2. Exactly one secondary, drawn at random, only when the primary came back
//    empty or failed
//
// Results are stamped with the provider that produced them.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use super::errors::ResolveError;
use super::models::{BackendResult, ContentIdentifier, Provenance, ResolvedStream, SearchResult};
use super::traits::{choose, Backend, RandomSource};

pub struct ResolutionEngine {
    primary: Arc<dyn Backend>,
    secondaries: Vec<Arc<dyn Backend>>,
    random: Arc<dyn RandomSource>,
    fallback_related: SearchResult,
}

impl ResolutionEngine {
    pub fn new(
        primary: Arc<dyn Backend>,
        secondaries: Vec<Arc<dyn Backend>>,
        random: Arc<dyn RandomSource>,
        fallback_related: SearchResult,
    ) -> Self {
        Self {
            primary,
            secondaries,
            random,
            fallback_related,
        }
    }

    /// Names of all configured backends, primary first
    pub fn backend_names(&self) -> Vec<String> {
        std::iter::once(&self.primary)
            .chain(self.secondaries.iter())
            .map(|b| b.name().to_string())
            .collect()
    }

    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, ResolveError> {
        let outcome = self
            .tiered("search", move |backend| async move {
                backend.search(query, limit).await.non_empty()
            })
            .await;

        match outcome {
            BackendResult::Success(results) => Ok(dedup_by_identifier(results)),
            BackendResult::Empty => Err(ResolveError::NotFound(format!(
                "no results for '{}'",
                query
            ))),
            BackendResult::Failure(e) => Err(ResolveError::ResolutionFailed(e.short_cause())),
        }
    }

    pub async fn resolve_stream(&self, id: &ContentIdentifier) -> Result<ResolvedStream, ResolveError> {
        let outcome = self
            .tiered("resolve_stream", move |backend| async move {
                backend.resolve_stream(id).await
            })
            .await;

        match outcome {
            BackendResult::Success(stream) => Ok(stream),
            BackendResult::Empty => Err(ResolveError::ResolutionFailed(format!(
                "no playable stream for {}",
                id
            ))),
            BackendResult::Failure(e) => Err(ResolveError::ResolutionFailed(e.short_cause())),
        }
    }

    /// Never fails: degrades to the configured default recommendation
    pub async fn resolve_related(&self, id: &ContentIdentifier) -> SearchResult {
        let outcome = self
            .tiered("resolve_related", move |backend| async move {
                backend.resolve_related(id).await
            })
            .await;

        match outcome {
            BackendResult::Success(item) => item,
            _ => {
                tracing::info!(%id, fallback = %self.fallback_related.identifier, "using default related item");
                self.fallback_related.clone()
            }
        }
    }

    async fn tiered<T, F, Fut>(&self, operation: &'static str, call: F) -> BackendResult<T>
    where
        T: Provenance,
        F: Fn(Arc<dyn Backend>) -> Fut,
        Fut: Future<Output = BackendResult<T>>,
    {
        let primary = self.attempt(operation, &self.primary, &call).await;
        if primary.is_success() {
            return primary;
        }

        match choose(self.random.as_ref(), &self.secondaries) {
            Some(secondary) => self.attempt(operation, secondary, &call).await,
            None => primary,
        }
    }

    async fn attempt<T, F, Fut>(
        &self,
        operation: &'static str,
        backend: &Arc<dyn Backend>,
        call: &F,
    ) -> BackendResult<T>
    where
        T: Provenance,
        F: Fn(Arc<dyn Backend>) -> Fut,
        Fut: Future<Output = BackendResult<T>>,
    {
        let name = backend.name().to_string();
        tracing::debug!(backend = %name, operation, "trying backend");

        match call(backend.clone()).await {
            BackendResult::Success(payload) => {
                tracing::info!(backend = %name, operation, "backend succeeded");
                BackendResult::Success(payload.with_provider(&name))
            }
            BackendResult::Empty => {
                tracing::info!(backend = %name, operation, "backend returned nothing");
                BackendResult::Empty
            }
            BackendResult::Failure(e) => {
                tracing::warn!(backend = %name, operation, error = %e, "backend failed");
                BackendResult::Failure(e)
            }
        }
    }
}

/// Keep the first occurrence of each identifier, preserving order
fn dedup_by_identifier(mut results: Vec<SearchResult>) -> Vec<SearchResult> {
    let mut seen = HashSet::new();
    results.retain(|result| seen.insert(result.identifier.clone()));
    results
}
