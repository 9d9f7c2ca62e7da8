// Backend trait and randomness seam

use async_trait::async_trait;
use rand::Rng;

use super::models::{BackendResult, ContentIdentifier, ResolvedStream, SearchResult};

/// Capability set of one upstream provider
#[async_trait]
pub trait Backend: Send + Sync {
    /// Provider name, used for logging and provenance tags
    fn name(&self) -> &str;

    /// Free-text search, results in provider relevance order
    async fn search(&self, query: &str, limit: usize) -> BackendResult<Vec<SearchResult>>;

    /// Turn an identifier into a playable stream
    async fn resolve_stream(&self, id: &ContentIdentifier) -> BackendResult<ResolvedStream>;

    /// Pick one related item at random
    async fn resolve_related(&self, id: &ContentIdentifier) -> BackendResult<SearchResult>;
}

/// Source of uniform random choices
pub trait RandomSource: Send + Sync {
    /// Uniform index in `0..len`. `len` is never zero.
    fn pick_index(&self, len: usize) -> usize;
}

/// Picks one element of a slice through a [`RandomSource`]
pub fn choose<'a, T>(random: &dyn RandomSource, items: &'a [T]) -> Option<&'a T> {
    if items.is_empty() {
        return None;
    }
    items.get(random.pick_index(items.len()))
}

/// Thread-local RNG
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn pick_index(&self, len: usize) -> usize {
        rand::rng().random_range(0..len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Always(usize);

    impl RandomSource for Always {
        fn pick_index(&self, _len: usize) -> usize {
            self.0
        }
    }

    #[test]
    fn choose_on_empty_slice_is_none() {
        let items: [u8; 0] = [];
        assert!(choose(&ThreadRandom, &items).is_none());
    }

    #[test]
    fn choose_uses_source_index() {
        let items = ["a", "b", "c"];
        assert_eq!(choose(&Always(2), &items), Some(&"c"));
    }

    #[test]
    fn thread_random_stays_in_range() {
        for _ in 0..100 {
            assert!(ThreadRandom.pick_index(3) < 3);
        }
    }
}
