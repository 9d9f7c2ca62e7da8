// CLI InfoExtractor - uses native `yt-dlp` binary
//
// Faster start-up than Python mode and no Python dependency, but more
// likely to trigger YouTube bot detection.

use async_trait::async_trait;
use tokio::sync::OnceCell;

use super::diagnostics::classify_failure;
use super::traits::{ExtractRequest, ExtractorConfig, InfoExtractor, YtDlpInfo};
use crate::resolver::errors::BackendError;
use crate::resolver::utils::{locate_binary, run_output_with_timeout};

/// Desktop browser identity passed to the binary
const CLI_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36";

/// CLI-based info extractor using yt-dlp binary
pub struct CliInfoExtractor {
    ytdlp_path: String,
    available: OnceCell<bool>,
}

impl CliInfoExtractor {
    pub fn new() -> Self {
        Self {
            ytdlp_path: Self::find_ytdlp(),
            available: OnceCell::new(),
        }
    }

    /// Find yt-dlp binary
    fn find_ytdlp() -> String {
        locate_binary(
            "yt-dlp",
            &[
                "/opt/homebrew/bin/yt-dlp", // Homebrew on Apple Silicon
                "/usr/local/bin/yt-dlp",    // Homebrew on Intel Mac, pipx
                "/usr/bin/yt-dlp",          // System installation
            ],
        )
    }

    async fn has_ytdlp_binary(&self) -> bool {
        match run_output_with_timeout(&self.ytdlp_path, &["--version".to_string()], 10).await {
            Ok(out) => out.status.success(),
            Err(_) => false,
        }
    }

    fn build_args(request: &ExtractRequest, config: &ExtractorConfig) -> Vec<String> {
        let mut args = vec!["--user-agent".to_string(), CLI_USER_AGENT.to_string()];
        args.extend(request.build_args(config));
        args
    }
}

impl Default for CliInfoExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InfoExtractor for CliInfoExtractor {
    fn name(&self) -> &'static str {
        "cli-yt-dlp"
    }

    async fn is_available(&self) -> bool {
        *self
            .available
            .get_or_init(|| async {
                let available = self.has_ytdlp_binary().await;
                tracing::info!(path = %self.ytdlp_path, available, "probed yt-dlp binary");
                available
            })
            .await
    }

    async fn extract(
        &self,
        request: &ExtractRequest,
        config: &ExtractorConfig,
    ) -> Result<YtDlpInfo, BackendError> {
        if !self.is_available().await {
            return Err(BackendError::ToolNotFound(
                "yt-dlp binary not found".to_string(),
            ));
        }

        let args = Self::build_args(request, config);
        tracing::debug!(path = %self.ytdlp_path, target = %request.target, "running yt-dlp binary");

        let output =
            run_output_with_timeout(&self.ytdlp_path, &args, u64::from(config.timeout_seconds))
                .await?;

        if !output.status.success() {
            return Err(classify_failure(&String::from_utf8_lossy(&output.stderr)));
        }

        YtDlpInfo::parse(&output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_args_carry_user_agent() {
        let args = CliInfoExtractor::build_args(
            &ExtractRequest::search("x", 3),
            &ExtractorConfig::default(),
        );
        assert_eq!(args[0], "--user-agent");
        assert_eq!(args.last().map(String::as_str), Some("ytsearch3:x"));
    }
}
