// InfoExtractor trait and common types

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::Deserialize;

use crate::resolver::errors::BackendError;

/// Extraction mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtractorMode {
    /// Python module yt_dlp
    Python,
    /// CLI binary yt-dlp
    Cli,
    /// Auto-select: Python -> CLI fallback
    #[default]
    Auto,
}

impl fmt::Display for ExtractorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Python => write!(f, "python"),
            Self::Cli => write!(f, "cli"),
            Self::Auto => write!(f, "auto"),
        }
    }
}

impl FromStr for ExtractorMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "python" => Ok(Self::Python),
            "cli" => Ok(Self::Cli),
            "auto" => Ok(Self::Auto),
            other => Err(format!("unknown extractor mode '{}'", other)),
        }
    }
}

/// Configuration for info extraction
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    pub mode: ExtractorMode,
    /// SOCKS5/HTTP proxy URL
    pub proxy: Option<String>,
    /// Path to cookies.txt file
    pub cookies_path: Option<String>,
    /// Per-invocation timeout in seconds
    pub timeout_seconds: u32,
    /// Extra attempts for transient failures
    pub transient_retries: u32,
    /// YouTube player client (android, web, tv)
    pub player_client: Option<String>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            mode: ExtractorMode::Auto,
            proxy: None,
            cookies_path: None,
            timeout_seconds: 30,
            transient_retries: 2,
            player_client: None,
        }
    }
}

impl ExtractorConfig {
    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }

    pub fn with_cookies_path(mut self, path: Option<String>) -> Self {
        self.cookies_path = path;
        self
    }

    pub fn with_mode(mut self, mode: ExtractorMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_timeout(mut self, seconds: u32) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    pub fn with_transient_retries(mut self, retries: u32) -> Self {
        self.transient_retries = retries;
        self
    }

    pub fn with_player_client(mut self, client: Option<String>) -> Self {
        self.player_client = client;
        self
    }
}

/// One yt-dlp invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractRequest {
    /// Page URL or `ytsearchN:` expression
    pub target: String,
    /// `-f` format selector
    pub format: Option<String>,
    /// List entries without resolving each one
    pub flat: bool,
}

impl ExtractRequest {
    pub fn page(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            format: None,
            flat: false,
        }
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn search(query: &str, limit: usize) -> Self {
        Self {
            target: format!("ytsearch{}:{}", limit, query),
            format: None,
            flat: true,
        }
    }

    /// yt-dlp arguments shared by every extractor mode
    pub fn build_args(&self, config: &ExtractorConfig) -> Vec<String> {
        let mut args = vec![
            "--dump-single-json".to_string(),
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
            "--socket-timeout".to_string(),
            config.timeout_seconds.to_string(),
            "--retries".to_string(),
            "2".to_string(),
        ];

        if self.flat {
            args.push("--flat-playlist".to_string());
        }

        if let Some(format) = &self.format {
            args.push("-f".to_string());
            args.push(format.clone());
        }

        if let Some(client) = &config.player_client {
            args.push("--extractor-args".to_string());
            args.push(format!("youtube:player_client={}", client));
        }

        if let Some(path) = &config.cookies_path {
            args.push("--cookies".to_string());
            args.push(path.clone());
        }

        if let Some(proxy) = &config.proxy {
            args.push("--proxy".to_string());
            args.push(proxy.clone());
        }

        // Keep the target last so a leading '-' can't be read as an option
        args.push("--".to_string());
        args.push(self.target.clone());
        args
    }
}

/// Format entry as printed by yt-dlp
#[derive(Debug, Clone, Default, Deserialize)]
pub struct YtDlpFormat {
    pub format_id: Option<String>,
    pub url: Option<String>,
    pub ext: Option<String>,
    pub vcodec: Option<String>,
    pub acodec: Option<String>,
    /// Audio bitrate in kbps
    pub abr: Option<f32>,
    /// Total bitrate in kbps
    pub tbr: Option<f32>,
    pub height: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct YtDlpThumbnail {
    pub url: Option<String>,
}

/// Flat entry: a search hit or a related video
#[derive(Debug, Clone, Default, Deserialize)]
pub struct YtDlpEntry {
    pub id: Option<String>,
    pub title: Option<String>,
    pub thumbnail: Option<String>,
    pub thumbnails: Option<Vec<YtDlpThumbnail>>,
    pub duration: Option<f64>,
    pub view_count: Option<u64>,
}

impl YtDlpEntry {
    /// Explicit thumbnail, else the last (largest) listed one
    pub fn best_thumbnail(&self) -> Option<String> {
        self.thumbnail.clone().or_else(|| {
            self.thumbnails
                .as_ref()?
                .iter()
                .rev()
                .find_map(|t| t.url.clone())
        })
    }
}

/// Top-level `--dump-single-json` document
#[derive(Debug, Clone, Default, Deserialize)]
pub struct YtDlpInfo {
    pub id: Option<String>,
    pub title: Option<String>,
    /// Selected format, flattened into the top level
    #[serde(flatten)]
    pub selected: YtDlpFormat,
    pub requested_formats: Option<Vec<YtDlpFormat>>,
    pub entries: Option<Vec<YtDlpEntry>>,
    pub related_videos: Option<Vec<YtDlpEntry>>,
}

impl YtDlpInfo {
    pub fn parse(stdout: &[u8]) -> Result<Self, BackendError> {
        serde_json::from_slice(stdout)
            .map_err(|e| BackendError::ParseError(format!("Invalid JSON: {}", e)))
    }
}

/// Trait for info extractors
#[async_trait]
pub trait InfoExtractor: Send + Sync {
    /// Name of the extractor (for logging)
    fn name(&self) -> &'static str;

    /// Check if this extractor is available
    async fn is_available(&self) -> bool;

    /// Run one extraction and parse its JSON document
    async fn extract(
        &self,
        request: &ExtractRequest,
        config: &ExtractorConfig,
    ) -> Result<YtDlpInfo, BackendError>;
}
