// Python InfoExtractor - uses `python3 -m yt_dlp`
//
// Better at getting past YouTube bot detection than the frozen binary,
// but requires Python 3 with the yt_dlp module installed.

use async_trait::async_trait;
use tokio::sync::OnceCell;

use super::diagnostics::classify_failure;
use super::traits::{ExtractRequest, ExtractorConfig, InfoExtractor, YtDlpInfo};
use crate::resolver::errors::BackendError;
use crate::resolver::utils::{locate_binary, run_output_with_timeout};

/// Python-based info extractor using yt_dlp module
pub struct PythonInfoExtractor {
    python_cmd: String,
    available: OnceCell<bool>,
}

impl PythonInfoExtractor {
    pub fn new() -> Self {
        Self {
            python_cmd: Self::find_python(),
            available: OnceCell::new(),
        }
    }

    /// Find Python interpreter
    fn find_python() -> String {
        // Allow override via environment variable
        if let Ok(custom) = std::env::var("YTDLP_PYTHON") {
            return custom;
        }

        locate_binary(
            "python3",
            &["/usr/bin/python3", "/usr/local/bin/python3", "/opt/homebrew/bin/python3"],
        )
    }

    /// Check if yt_dlp module is installed
    async fn has_ytdlp_module(&self) -> bool {
        let args = ["-c".to_string(), "import yt_dlp".to_string()];
        match run_output_with_timeout(&self.python_cmd, &args, 10).await {
            Ok(out) => out.status.success(),
            Err(_) => false,
        }
    }

    fn build_args(request: &ExtractRequest, config: &ExtractorConfig) -> Vec<String> {
        let mut args = vec!["-m".to_string(), "yt_dlp".to_string()];
        args.extend(request.build_args(config));
        args
    }
}

impl Default for PythonInfoExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InfoExtractor for PythonInfoExtractor {
    fn name(&self) -> &'static str {
        "python-yt-dlp"
    }

    async fn is_available(&self) -> bool {
        *self
            .available
            .get_or_init(|| async {
                let available = self.has_ytdlp_module().await;
                tracing::info!(python = %self.python_cmd, available, "probed yt_dlp module");
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
                "Python yt_dlp module not installed".to_string(),
            ));
        }

        let args = Self::build_args(request, config);
        tracing::debug!(python = %self.python_cmd, target = %request.target, "running yt_dlp module");

        let output =
            run_output_with_timeout(&self.python_cmd, &args, u64::from(config.timeout_seconds))
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
    fn module_invocation_prefix() {
        let args = PythonInfoExtractor::build_args(
            &ExtractRequest::page("https://youtu.be/abc"),
            &ExtractorConfig::default(),
        );
        assert_eq!(&args[..2], &["-m".to_string(), "yt_dlp".to_string()]);
        assert_eq!(args.last().map(String::as_str), Some("https://youtu.be/abc"));
    }
}
