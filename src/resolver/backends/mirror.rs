// Secondary backend: Invidious-style public mirror
//
// Same content as the primary, different JSON shape:
// - GET {base}/videos/{id}   -> title, adaptiveFormats, formatStreams, recommendedVideos
// - GET {base}/search?q=...  -> array of typed entries (videos, channels, playlists)

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use url::Url;

use crate::resolver::errors::BackendError;
use crate::resolver::format_selector::FormatSelector;
use crate::resolver::models::{
    BackendResult, ContentIdentifier, MimeCategory, Rendition, ResolvedStream, SearchResult,
};
use crate::resolver::traits::{choose, Backend, RandomSource};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MirrorVideo {
    title: Option<String>,
    #[serde(default)]
    adaptive_formats: Vec<MirrorFormat>,
    #[serde(default)]
    format_streams: Vec<MirrorFormat>,
    #[serde(default)]
    recommended_videos: Vec<MirrorEntry>,
}

#[derive(Debug, Deserialize)]
struct MirrorFormat {
    url: Option<String>,
    #[serde(rename = "type")]
    mime_type: Option<String>,
    /// Bits per second, sometimes sent as a string
    #[serde(default, deserialize_with = "lenient_u64")]
    bitrate: Option<u64>,
    container: Option<String>,
    resolution: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MirrorThumbnail {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MirrorEntry {
    #[serde(rename = "type")]
    kind: Option<String>,
    video_id: Option<String>,
    title: Option<String>,
    #[serde(default)]
    video_thumbnails: Vec<MirrorThumbnail>,
    #[serde(default, deserialize_with = "lenient_u64")]
    length_seconds: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    view_count: Option<u64>,
}

fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Lenient {
        Int(u64),
        Float(f64),
        Text(String),
    }

    Ok(match Option::<Lenient>::deserialize(deserializer)? {
        Some(Lenient::Int(n)) => Some(n),
        Some(Lenient::Float(f)) if f >= 0.0 => Some(f as u64),
        Some(Lenient::Text(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

impl MirrorFormat {
    fn to_rendition(&self) -> Option<Rendition> {
        let url = self.url.as_deref().filter(|u| !u.is_empty())?;
        Some(Rendition {
            url: url.to_string(),
            mime_category: self
                .mime_type
                .as_deref()
                .map(MimeCategory::from_mime)
                .unwrap_or(MimeCategory::Muxed),
            bitrate: self.bitrate.map(|bps| bps as f32 / 1000.0).unwrap_or(0.0),
            container_ext: self.container.clone(),
            height: self
                .resolution
                .as_deref()
                .and_then(|r| r.trim_end_matches('p').parse().ok()),
        })
    }
}

pub struct MirrorBackend {
    base: String,
    name: String,
    client: reqwest::Client,
    random: Arc<dyn RandomSource>,
}

impl MirrorBackend {
    /// `base` is the API root, e.g. `https://invidious.example/api/v1`
    pub fn new(base: &Url, client: reqwest::Client, random: Arc<dyn RandomSource>) -> Self {
        let host = base.host_str().unwrap_or("unknown");
        let name = match base.port() {
            Some(port) => format!("mirror:{}:{}", host, port),
            None => format!("mirror:{}", host),
        };

        Self {
            base: base.as_str().trim_end_matches('/').to_string(),
            name,
            client,
            random,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, BackendError> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Http(format!("{} returned {}", self.name, status)));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| BackendError::ParseError(format!("{}: {}", self.name, e)))
    }

    async fn fetch_video(&self, id: &ContentIdentifier) -> Result<MirrorVideo, BackendError> {
        let url = format!("{}/videos/{}", self.base, id);
        tracing::debug!(mirror = %self.name, %id, "fetching video");
        self.get_json(self.client.get(url)).await
    }

    fn to_search_result(&self, entry: &MirrorEntry) -> Option<SearchResult> {
        if entry.kind.as_deref().is_some_and(|kind| kind != "video") {
            return None;
        }
        let id = entry.video_id.as_deref().filter(|id| !id.is_empty())?;
        Some(SearchResult {
            identifier: ContentIdentifier::new(id),
            title: entry.title.clone().unwrap_or_else(|| "Untitled".to_string()),
            thumbnail: entry.video_thumbnails.iter().find_map(|t| t.url.clone()),
            duration: entry.length_seconds,
            view_count: entry.view_count,
            source_provider: self.name.clone(),
        })
    }
}

#[async_trait]
impl Backend for MirrorBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, query: &str, limit: usize) -> BackendResult<Vec<SearchResult>> {
        let request = self
            .client
            .get(format!("{}/search", self.base))
            .query(&[("q", query), ("type", "video")]);

        let result = self.get_json::<Vec<MirrorEntry>>(request).await.map(|entries| {
            entries
                .iter()
                .filter_map(|entry| self.to_search_result(entry))
                .take(limit)
                .collect::<Vec<_>>()
        });
        BackendResult::from(result).non_empty()
    }

    async fn resolve_stream(&self, id: &ContentIdentifier) -> BackendResult<ResolvedStream> {
        let resolved = self.fetch_video(id).await.map(|video| {
            let renditions: Vec<Rendition> = video
                .adaptive_formats
                .iter()
                .chain(video.format_streams.iter())
                .filter_map(MirrorFormat::to_rendition)
                .collect();

            FormatSelector::select(&renditions).map(|rendition| ResolvedStream {
                stream_url: rendition.url.clone(),
                title: video.title.clone().unwrap_or_else(|| "Untitled".to_string()),
                source_provider: self.name.clone(),
            })
        });
        BackendResult::from_optional(resolved)
    }

    async fn resolve_related(&self, id: &ContentIdentifier) -> BackendResult<SearchResult> {
        let related = self.fetch_video(id).await.map(|video| {
            let candidates: Vec<SearchResult> = video
                .recommended_videos
                .iter()
                .filter_map(|entry| self.to_search_result(entry))
                .collect();
            choose(self.random.as_ref(), &candidates).cloned()
        });
        BackendResult::from_optional(related)
    }
}
