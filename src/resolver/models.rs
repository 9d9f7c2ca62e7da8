// Common data models for the resolver

use std::fmt;

use serde::{Deserialize, Serialize};

use super::errors::BackendError;

/// Provider-scoped opaque key naming one content item
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentIdentifier(String);

impl ContentIdentifier {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One search hit, or one related recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(rename = "id")]
    pub identifier: ContentIdentifier,
    pub title: String,
    pub thumbnail: Option<String>,
    /// Duration in seconds
    pub duration: Option<u64>,
    pub view_count: Option<u64>,
    #[serde(rename = "source")]
    pub source_provider: String,
}

/// Broad category of a rendition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MimeCategory {
    Audio,
    Video,
    /// Audio and video in one container
    Muxed,
}

impl MimeCategory {
    /// Derive a category from yt-dlp style codec fields ("none" means absent)
    pub fn from_codecs(vcodec: Option<&str>, acodec: Option<&str>) -> Self {
        let present = |c: Option<&str>| c.is_some_and(|c| !c.is_empty() && c != "none");
        match (present(vcodec), present(acodec)) {
            (false, true) => Self::Audio,
            (true, false) => Self::Video,
            _ => Self::Muxed,
        }
    }

    /// Derive a category from a MIME type such as `audio/webm; codecs="opus"`.
    ///
    /// A `video/*` type listing two codecs is muxed; one codec is video-only.
    pub fn from_mime(mime: &str) -> Self {
        let lower = mime.to_ascii_lowercase();
        if lower.starts_with("audio/") {
            return Self::Audio;
        }
        let codec_count = lower
            .split_once("codecs=")
            .map(|(_, codecs)| codecs.split(',').count())
            .unwrap_or(0);
        if codec_count == 1 {
            Self::Video
        } else {
            Self::Muxed
        }
    }
}

/// One encoded variant of a content item. URLs are short-lived signed links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rendition {
    pub url: String,
    pub mime_category: MimeCategory,
    /// Bitrate in kbps
    pub bitrate: f32,
    pub container_ext: Option<String>,
    pub height: Option<u32>,
}

/// Final output of a stream resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedStream {
    pub stream_url: String,
    pub title: String,
    #[serde(rename = "source")]
    pub source_provider: String,
}

/// Outcome of one backend attempt
#[derive(Debug, Clone)]
pub enum BackendResult<T> {
    Success(T),
    /// Backend answered but had nothing
    Empty,
    Failure(BackendError),
}

impl<T> BackendResult<T> {
    pub fn from_option(value: Option<T>) -> Self {
        value.map_or(Self::Empty, Self::Success)
    }

    /// `Ok(None)` means the backend had nothing
    pub fn from_optional(result: Result<Option<T>, BackendError>) -> Self {
        match result {
            Ok(value) => Self::from_option(value),
            Err(e) => Self::Failure(e),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

impl<T> BackendResult<Vec<T>> {
    /// Treat an empty list as `Empty`
    pub fn non_empty(self) -> Self {
        match self {
            Self::Success(items) if items.is_empty() => Self::Empty,
            other => other,
        }
    }
}

impl<T> From<Result<T, BackendError>> for BackendResult<T> {
    fn from(result: Result<T, BackendError>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(e) => Self::Failure(e),
        }
    }
}

/// Stamp the originating provider on a payload
pub trait Provenance {
    fn with_provider(self, provider: &str) -> Self;
}

impl Provenance for SearchResult {
    fn with_provider(mut self, provider: &str) -> Self {
        self.source_provider = provider.to_string();
        self
    }
}

impl Provenance for ResolvedStream {
    fn with_provider(mut self, provider: &str) -> Self {
        self.source_provider = provider.to_string();
        self
    }
}

impl<T: Provenance> Provenance for Vec<T> {
    fn with_provider(self, provider: &str) -> Self {
        self.into_iter().map(|item| item.with_provider(provider)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_from_codecs() {
        assert_eq!(
            MimeCategory::from_codecs(Some("none"), Some("mp4a.40.2")),
            MimeCategory::Audio
        );
        assert_eq!(
            MimeCategory::from_codecs(Some("avc1.4d401f"), Some("none")),
            MimeCategory::Video
        );
        assert_eq!(
            MimeCategory::from_codecs(Some("avc1.4d401f"), Some("mp4a.40.2")),
            MimeCategory::Muxed
        );
    }

    #[test]
    fn categories_from_mime() {
        assert_eq!(
            MimeCategory::from_mime("audio/webm; codecs=\"opus\""),
            MimeCategory::Audio
        );
        assert_eq!(
            MimeCategory::from_mime("video/mp4; codecs=\"avc1.64001F\""),
            MimeCategory::Video
        );
        assert_eq!(
            MimeCategory::from_mime("video/mp4; codecs=\"avc1.42001E, mp4a.40.2\""),
            MimeCategory::Muxed
        );
    }

    #[test]
    fn empty_success_list_becomes_empty() {
        let result: BackendResult<Vec<u8>> = BackendResult::Success(vec![]);
        assert!(matches!(result.non_empty(), BackendResult::Empty));
    }
}
