// Error types for backends and the resolution engine

use thiserror::Error;

use super::extractors::BlockingReason;

/// Failure of a single backend call.
///
/// Never crosses the engine boundary: the engine logs it and turns it into
/// a [`ResolveError`] (or a fallback value for related lookups).
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// Upstream did not answer in time
    #[error("network timeout: upstream is not responding")]
    NetworkTimeout,

    /// Upstream refused or throttled the request
    #[error("{}: {message}", reason.description())]
    Blocked {
        reason: BlockingReason,
        message: String,
    },

    /// yt-dlp or python not found in system
    #[error("tool not found: {0}")]
    ToolNotFound(String),

    /// Requested format selector matched nothing
    #[error("format unavailable: {0}")]
    FormatUnavailable(String),

    /// Content does not exist or is not reachable
    #[error("content unavailable: {0}")]
    Unavailable(String),

    /// Non-success HTTP response or transport failure
    #[error("http error: {0}")]
    Http(String),

    /// Failed to parse provider JSON
    #[error("parse error: {0}")]
    ParseError(String),

    /// Command execution failed
    #[error("execution error: {0}")]
    ExecutionError(String),

    #[error("{0}")]
    Unknown(String),
}

impl BackendError {
    /// Whether the same call may succeed when repeated shortly after
    pub fn is_transient(&self) -> bool {
        match self {
            Self::NetworkTimeout => true,
            Self::Blocked { reason, .. } => reason.is_retryable(),
            _ => false,
        }
    }

    /// Short cause string, safe to show to clients
    pub fn short_cause(&self) -> String {
        let text = self.to_string();
        let first_line = text.lines().next().unwrap_or_default();
        first_line.chars().take(160).collect()
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::NetworkTimeout
        } else if e.is_decode() {
            Self::ParseError(e.to_string())
        } else {
            Self::Http(e.to_string())
        }
    }
}

/// Outcome taxonomy surfaced by the engine and the HTTP layer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    /// Missing or malformed required parameter
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Well-formed request, nothing located
    #[error("not found: {0}")]
    NotFound(String),

    /// Every backend tier was exhausted
    #[error("resolution failed: {0}")]
    ResolutionFailed(String),

    /// Relay upstream failed; only ever logged, the stream is truncated instead
    #[error("upstream stream error: {0}")]
    UpstreamStream(String),
}
