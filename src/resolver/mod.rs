// Resolver module: locator parsing, backends and the resolution engine

pub mod backends;
pub mod errors;
pub mod extractors;
pub mod format_selector;
pub mod locator;
pub mod models;
pub mod orchestrator;
pub mod traits;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

pub use errors::{BackendError, ResolveError};
pub use format_selector::FormatSelector;
pub use models::{BackendResult, ContentIdentifier, MimeCategory, Rendition, ResolvedStream, SearchResult};
pub use orchestrator::ResolutionEngine;
pub use traits::{Backend, RandomSource, ThreadRandom};
