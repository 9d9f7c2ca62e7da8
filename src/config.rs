//! Runtime configuration.
//!
//! Flags are parsed once at startup (with `STREAM_RESOLVER_*` environment
//! fallbacks) into an immutable [`AppConfig`] that is handed to constructors.

use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;
use thiserror::Error;
use url::Url;

use crate::resolver::backends::DEFAULT_FORMAT_PREFERENCES;
use crate::resolver::extractors::{ExtractorConfig, ExtractorMode};
use crate::resolver::{ContentIdentifier, SearchResult};

/// Browser identities the relay rotates through
pub const DEFAULT_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_4) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_4 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Mobile/15E148 Safari/604.1",
];

pub const DEFAULT_MIRRORS: &[&str] = &["https://yewtu.be/api/v1", "https://inv.nadeko.net/api/v1"];

pub const DEFAULT_RELATED_ID: &str = "jNQXAC9IVRw";
pub const DEFAULT_RELATED_TITLE: &str = "Me at the zoo";

/// Provider tag carried by the default related item
pub const FALLBACK_PROVIDER: &str = "fallback";

pub const MAX_SEARCH_LIMIT: usize = 50;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid mirror URL '{url}': {reason}")]
    InvalidMirror { url: String, reason: String },

    #[error("{0}")]
    InvalidMode(String),

    #[error("search limit must be between 1 and {MAX_SEARCH_LIMIT}, got {0}")]
    InvalidSearchLimit(usize),

    #[error("user agent pool is empty")]
    NoUserAgents,
}

/// Command-line flags
#[derive(Debug, Clone, Parser)]
#[command(name = "stream-resolver")]
#[command(about = "Resolve media locators into playable streams and relay them")]
pub struct CliArgs {
    /// Address to listen on
    #[arg(long, env = "STREAM_RESOLVER_BIND", default_value = "0.0.0.0:5000")]
    pub bind: SocketAddr,

    /// Console log level (RUST_LOG takes precedence)
    #[arg(long, env = "STREAM_RESOLVER_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Mirror API roots, comma separated. Pass an empty value to disable mirrors.
    #[arg(long, env = "STREAM_RESOLVER_MIRRORS", value_delimiter = ',')]
    pub mirrors: Option<Vec<String>>,

    /// Proxy for extractor, mirror and relay traffic (http, https or socks5)
    #[arg(long, env = "STREAM_RESOLVER_PROXY")]
    pub proxy: Option<String>,

    /// Netscape cookies file handed to yt-dlp
    #[arg(long, env = "STREAM_RESOLVER_COOKIES")]
    pub cookies: Option<String>,

    /// yt-dlp invocation mode: python, cli or auto
    #[arg(long, env = "STREAM_RESOLVER_EXTRACTOR_MODE", default_value = "auto")]
    pub extractor_mode: String,

    /// YouTube player client passed to yt-dlp (e.g. "android")
    #[arg(long, env = "STREAM_RESOLVER_PLAYER_CLIENT")]
    pub player_client: Option<String>,

    /// Default search result count
    #[arg(long, env = "STREAM_RESOLVER_SEARCH_LIMIT", default_value_t = 10)]
    pub search_limit: usize,

    /// Format preferences for stream resolution, comma separated
    #[arg(long, env = "STREAM_RESOLVER_FORMATS", value_delimiter = ',')]
    pub formats: Vec<String>,

    #[arg(long, env = "STREAM_RESOLVER_EXTRACTOR_TIMEOUT", default_value_t = 30)]
    pub extractor_timeout_secs: u32,

    /// Extra attempts for transient extractor failures
    #[arg(long, env = "STREAM_RESOLVER_EXTRACTOR_RETRIES", default_value_t = 2)]
    pub extractor_retries: u32,

    #[arg(long, env = "STREAM_RESOLVER_MIRROR_TIMEOUT", default_value_t = 15)]
    pub mirror_timeout_secs: u64,

    #[arg(long, env = "STREAM_RESOLVER_RELAY_CONNECT_TIMEOUT", default_value_t = 10)]
    pub relay_connect_timeout_secs: u64,

    /// Maximum wait for each upstream chunk
    #[arg(long, env = "STREAM_RESOLVER_RELAY_READ_TIMEOUT", default_value_t = 30)]
    pub relay_read_timeout_secs: u64,

    /// Relay User-Agent pool, separated by '|'
    #[arg(long, env = "STREAM_RESOLVER_USER_AGENTS", value_delimiter = '|')]
    pub user_agents: Vec<String>,

    /// Identifier returned by /api/related when nothing could be resolved
    #[arg(long, env = "STREAM_RESOLVER_RELATED_FALLBACK_ID", default_value = DEFAULT_RELATED_ID)]
    pub related_fallback_id: String,

    #[arg(long, env = "STREAM_RESOLVER_RELATED_FALLBACK_TITLE", default_value = DEFAULT_RELATED_TITLE)]
    pub related_fallback_title: String,
}

/// Streaming relay settings
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub user_agents: Vec<String>,
    pub proxy: Option<String>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(30),
            user_agents: DEFAULT_USER_AGENTS.iter().map(|ua| ua.to_string()).collect(),
            proxy: None,
        }
    }
}

/// Mirror pool settings
#[derive(Debug, Clone)]
pub struct MirrorConfig {
    pub base_urls: Vec<Url>,
    pub timeout: Duration,
    pub proxy: Option<String>,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            base_urls: DEFAULT_MIRRORS.iter().filter_map(|m| Url::parse(m).ok()).collect(),
            timeout: Duration::from_secs(15),
            proxy: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind: SocketAddr,
    pub log_level: String,
    pub extractor: ExtractorConfig,
    pub format_preferences: Vec<String>,
    pub search_limit: usize,
    pub mirrors: MirrorConfig,
    pub relay: RelayConfig,
    pub fallback_related: SearchResult,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 5000)),
            log_level: "info".to_string(),
            extractor: ExtractorConfig::default(),
            format_preferences: DEFAULT_FORMAT_PREFERENCES.iter().map(|f| f.to_string()).collect(),
            search_limit: 10,
            mirrors: MirrorConfig::default(),
            relay: RelayConfig::default(),
            fallback_related: fallback_item(DEFAULT_RELATED_ID, DEFAULT_RELATED_TITLE),
        }
    }
}

fn fallback_item(id: &str, title: &str) -> SearchResult {
    SearchResult {
        identifier: ContentIdentifier::new(id),
        title: title.to_string(),
        thumbnail: None,
        duration: None,
        view_count: None,
        source_provider: FALLBACK_PROVIDER.to_string(),
    }
}

fn parse_mirror(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidMirror {
        url: raw.to_string(),
        reason,
    };
    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(invalid(format!("unsupported scheme '{}'", other))),
    }
}

impl AppConfig {
    pub fn from_args(args: CliArgs) -> Result<Self, ConfigError> {
        let mode: ExtractorMode = args
            .extractor_mode
            .parse()
            .map_err(ConfigError::InvalidMode)?;

        if args.search_limit == 0 || args.search_limit > MAX_SEARCH_LIMIT {
            return Err(ConfigError::InvalidSearchLimit(args.search_limit));
        }

        let proxy = args.proxy.filter(|p| !p.trim().is_empty());

        let extractor = ExtractorConfig::default()
            .with_mode(mode)
            .with_timeout(args.extractor_timeout_secs)
            .with_transient_retries(args.extractor_retries)
            .with_proxy(proxy.clone())
            .with_cookies_path(args.cookies.filter(|c| !c.is_empty()))
            .with_player_client(args.player_client.filter(|c| !c.is_empty()));

        let base_urls = match args.mirrors {
            Some(mirrors) => mirrors
                .iter()
                .map(|m| m.trim())
                .filter(|m| !m.is_empty())
                .map(parse_mirror)
                .collect::<Result<Vec<_>, _>>()?,
            None => MirrorConfig::default().base_urls,
        };

        let user_agents: Vec<String> = if args.user_agents.is_empty() {
            RelayConfig::default().user_agents
        } else {
            args.user_agents
                .into_iter()
                .map(|ua| ua.trim().to_string())
                .filter(|ua| !ua.is_empty())
                .collect()
        };
        if user_agents.is_empty() {
            return Err(ConfigError::NoUserAgents);
        }

        let format_preferences: Vec<String> = args
            .formats
            .into_iter()
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty())
            .collect();

        Ok(Self {
            bind: args.bind,
            log_level: args.log_level,
            extractor,
            format_preferences,
            search_limit: args.search_limit,
            mirrors: MirrorConfig {
                base_urls,
                timeout: Duration::from_secs(args.mirror_timeout_secs),
                proxy: proxy.clone(),
            },
            relay: RelayConfig {
                connect_timeout: Duration::from_secs(args.relay_connect_timeout_secs),
                read_timeout: Duration::from_secs(args.relay_read_timeout_secs),
                user_agents,
                proxy,
            },
            fallback_related: fallback_item(&args.related_fallback_id, &args.related_fallback_title),
        })
    }
}
