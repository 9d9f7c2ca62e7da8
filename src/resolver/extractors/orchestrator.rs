// InfoExtractor Orchestrator - mode selection, fallback and transient retries
//
// Strategy:
// 1. Python mode preferred when the module is installed (better anti-bot)
// 2. CLI binary as fallback
// 3. Transient failures (timeouts, throttling) retried a bounded number of times

use std::time::Duration;

use super::cli::CliInfoExtractor;
use super::python::PythonInfoExtractor;
use super::traits::{ExtractRequest, ExtractorConfig, ExtractorMode, InfoExtractor, YtDlpInfo};
use crate::resolver::errors::BackendError;

const RETRY_BACKOFF: Duration = Duration::from_millis(750);

/// Orchestrator that manages Python and CLI extractors
pub struct InfoExtractorOrchestrator {
    python: Box<dyn InfoExtractor>,
    cli: Box<dyn InfoExtractor>,
}

impl InfoExtractorOrchestrator {
    pub fn new() -> Self {
        Self::with_extractors(
            Box::new(PythonInfoExtractor::new()),
            Box::new(CliInfoExtractor::new()),
        )
    }

    pub fn with_extractors(python: Box<dyn InfoExtractor>, cli: Box<dyn InfoExtractor>) -> Self {
        Self { python, cli }
    }

    /// Extract with mode selection, retrying transient failures
    pub async fn extract(
        &self,
        request: &ExtractRequest,
        config: &ExtractorConfig,
    ) -> Result<YtDlpInfo, BackendError> {
        let mut attempt = 0;
        loop {
            match self.extract_once(request, config).await {
                Ok(info) => return Ok(info),
                Err(e) if e.is_transient() && attempt < config.transient_retries => {
                    attempt += 1;
                    tracing::warn!(
                        target = %request.target,
                        attempt,
                        error = %e,
                        "transient extractor failure, retrying"
                    );
                    tokio::time::sleep(RETRY_BACKOFF * attempt).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn extract_once(
        &self,
        request: &ExtractRequest,
        config: &ExtractorConfig,
    ) -> Result<YtDlpInfo, BackendError> {
        match config.mode {
            ExtractorMode::Python => self.python.extract(request, config).await,
            ExtractorMode::Cli => self.cli.extract(request, config).await,
            ExtractorMode::Auto => self.extract_auto(request, config).await,
        }
    }

    async fn extract_auto(
        &self,
        request: &ExtractRequest,
        config: &ExtractorConfig,
    ) -> Result<YtDlpInfo, BackendError> {
        if self.python.is_available().await {
            match self.python.extract(request, config).await {
                Ok(info) => return Ok(info),
                // The binary would hit the same wall
                Err(e @ (BackendError::FormatUnavailable(_) | BackendError::Unavailable(_))) => {
                    return Err(e)
                }
                Err(e @ BackendError::Blocked { .. }) if is_permanent_block(&e) => return Err(e),
                Err(e) => {
                    tracing::info!(
                        primary = self.python.name(),
                        fallback = self.cli.name(),
                        error = %e,
                        "primary extractor failed, trying fallback"
                    );
                }
            }
        }

        if self.cli.is_available().await {
            return self.cli.extract(request, config).await;
        }

        Err(BackendError::ToolNotFound(
            "Neither Python yt_dlp nor yt-dlp binary available".to_string(),
        ))
    }
}

fn is_permanent_block(error: &BackendError) -> bool {
    matches!(error, BackendError::Blocked { reason, .. } if reason.is_permanent())
}

impl Default for InfoExtractorOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}
