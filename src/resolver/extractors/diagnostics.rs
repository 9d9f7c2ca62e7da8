// Failure diagnostics - identifies why an extraction failed
//
// Analyzes yt-dlp stderr to determine:
// - Type of blocking (403, rate limit, bot check, etc.)
// - Whether retrying the same call might help

use serde::{Deserialize, Serialize};

use crate::resolver::errors::BackendError;

/// Reasons why an extraction might fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockingReason {
    /// HTTP 403 Forbidden - general access denied
    Http403Forbidden,

    /// Proof of Origin token required
    PoTokenRequired,

    /// Age-restricted content requiring login
    AgeRestricted,

    /// Geographic restriction
    GeoBlocked,

    /// Network timeout (soft IP block)
    NetworkTimeout,

    /// Rate limiting (429 or similar)
    RateLimited,

    /// Bot detection triggered
    BotDetection,

    /// Private video requiring authorization
    PrivateVideo,

    /// Video deleted or unavailable
    VideoUnavailable,

    /// The `-f` selector matched no format
    FormatUnavailable,

    Unknown,
}

impl BlockingReason {
    /// Check if this reason is retryable without changing settings
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Http403Forbidden | Self::NetworkTimeout | Self::RateLimited | Self::BotDetection
        )
    }

    /// Check if this is a permanent property of the content
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            Self::VideoUnavailable | Self::PrivateVideo | Self::GeoBlocked | Self::AgeRestricted
        )
    }

    /// Human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::Http403Forbidden => "Access denied (HTTP 403)",
            Self::PoTokenRequired => "Proof of Origin token required",
            Self::AgeRestricted => "Age-restricted content",
            Self::GeoBlocked => "Geographic restriction",
            Self::NetworkTimeout => "Network timeout (possible IP throttling)",
            Self::RateLimited => "Rate limited by upstream",
            Self::BotDetection => "Bot detection triggered",
            Self::PrivateVideo => "Private video",
            Self::VideoUnavailable => "Video unavailable",
            Self::FormatUnavailable => "Requested format is not available",
            Self::Unknown => "Unknown blocking reason",
        }
    }
}

/// Analyze error message and return blocking reason
pub fn diagnose_error(error: &str) -> Option<BlockingReason> {
    let lower = error.to_lowercase();

    if lower.contains("requested format is not available") {
        return Some(BlockingReason::FormatUnavailable);
    }

    if lower.contains("po token") || lower.contains("proof of origin") {
        return Some(BlockingReason::PoTokenRequired);
    }

    if lower.contains("age-restricted")
        || lower.contains("sign in to confirm your age")
        || lower.contains("age_verification")
    {
        return Some(BlockingReason::AgeRestricted);
    }

    if lower.contains("private video")
        || lower.contains("video is private")
        || lower.contains("sign in if you've been granted access")
    {
        return Some(BlockingReason::PrivateVideo);
    }

    if lower.contains("video unavailable")
        || lower.contains("video has been removed")
        || lower.contains("this video is no longer available")
        || lower.contains("video is unavailable")
    {
        return Some(BlockingReason::VideoUnavailable);
    }

    if lower.contains("not available in your country")
        || lower.contains("blocked in your country")
        || lower.contains("geo restriction")
        || lower.contains("geo-restricted")
    {
        return Some(BlockingReason::GeoBlocked);
    }

    if lower.contains("429") || lower.contains("rate limit") || lower.contains("too many requests") {
        return Some(BlockingReason::RateLimited);
    }

    if lower.contains("not a bot")
        || lower.contains("captcha")
        || lower.contains("unusual traffic")
        || lower.contains("automated")
    {
        return Some(BlockingReason::BotDetection);
    }

    if lower.contains("403") || lower.contains("forbidden") {
        return Some(BlockingReason::Http403Forbidden);
    }

    if lower.contains("timeout")
        || lower.contains("timed out")
        || lower.contains("connection refused")
        || lower.contains("network unreachable")
        || lower.contains("connection reset")
    {
        return Some(BlockingReason::NetworkTimeout);
    }

    if !error.trim().is_empty() {
        return Some(BlockingReason::Unknown);
    }

    None
}

/// Turn extractor stderr into a typed backend error
pub fn classify_failure(stderr: &str) -> BackendError {
    let message = stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| line.to_lowercase().starts_with("error:"))
        .or_else(|| stderr.lines().map(str::trim).find(|line| !line.is_empty()))
        .unwrap_or("extractor exited without output")
        .to_string();

    match diagnose_error(stderr) {
        Some(BlockingReason::NetworkTimeout) => BackendError::NetworkTimeout,
        Some(BlockingReason::FormatUnavailable) => BackendError::FormatUnavailable(message),
        Some(reason @ (BlockingReason::VideoUnavailable | BlockingReason::PrivateVideo)) => {
            BackendError::Unavailable(format!("{}: {}", reason.description(), message))
        }
        Some(BlockingReason::Unknown) | None => BackendError::Unknown(message),
        Some(reason) => BackendError::Blocked { reason, message },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_403_detection() {
        let error = "ERROR: HTTP Error 403: Forbidden";
        assert_eq!(diagnose_error(error), Some(BlockingReason::Http403Forbidden));
    }

    #[test]
    fn test_rate_limit_detection() {
        let error = "ERROR: HTTP Error 429: Too Many Requests";
        assert_eq!(diagnose_error(error), Some(BlockingReason::RateLimited));
    }

    #[test]
    fn test_bot_detection() {
        let error = "ERROR: [youtube] abc: Sign in to confirm you're not a bot";
        assert_eq!(diagnose_error(error), Some(BlockingReason::BotDetection));
    }

    #[test]
    fn test_timeout_detection() {
        let error = "ERROR: Unable to download webpage: The read operation timed out";
        assert_eq!(diagnose_error(error), Some(BlockingReason::NetworkTimeout));
    }

    #[test]
    fn test_format_unavailable_detection() {
        let error = "ERROR: [youtube] abc: Requested format is not available. Use --list-formats";
        assert_eq!(diagnose_error(error), Some(BlockingReason::FormatUnavailable));
    }

    #[test]
    fn test_unavailable_detection() {
        let error = "ERROR: [youtube] abc: Video unavailable";
        assert_eq!(diagnose_error(error), Some(BlockingReason::VideoUnavailable));
        assert!(BlockingReason::VideoUnavailable.is_permanent());
    }

    #[test]
    fn test_empty_stderr_is_undiagnosed() {
        assert_eq!(diagnose_error("  "), None);
    }

    #[test]
    fn classify_keeps_last_error_line() {
        let stderr = "WARNING: something\nERROR: HTTP Error 429: Too Many Requests\n";
        match classify_failure(stderr) {
            BackendError::Blocked { reason, message } => {
                assert_eq!(reason, BlockingReason::RateLimited);
                assert_eq!(message, "ERROR: HTTP Error 429: Too Many Requests");
            }
            other => panic!("unexpected classification: {other:?}"),
        }
    }

    #[test]
    fn classify_retryability_follows_reason() {
        assert!(classify_failure("ERROR: HTTP Error 403: Forbidden").is_transient());
        assert!(!classify_failure("ERROR: Video unavailable").is_transient());
        assert!(!classify_failure("ERROR: Requested format is not available").is_transient());
    }
}
