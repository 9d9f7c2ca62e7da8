// Primary backend: yt-dlp extraction
//
// Stream resolution walks a fixed list of format preferences and stops at
// the first one that yields renditions. The FormatSelector then picks one.

use std::sync::Arc;

use async_trait::async_trait;

use crate::resolver::errors::BackendError;
use crate::resolver::extractors::{
    ExtractRequest, ExtractorConfig, InfoExtractorOrchestrator, YtDlpEntry, YtDlpFormat, YtDlpInfo,
};
use crate::resolver::format_selector::FormatSelector;
use crate::resolver::models::{
    BackendResult, ContentIdentifier, MimeCategory, Rendition, ResolvedStream, SearchResult,
};
use crate::resolver::traits::{choose, Backend, RandomSource};

/// Default order: small audio container, any audio, capped video, anything
pub const DEFAULT_FORMAT_PREFERENCES: &[&str] =
    &["bestaudio[ext=m4a]", "bestaudio", "best[height<=720]", "best"];

const WATCH_URL_BASE: &str = "https://www.youtube.com/watch?v=";

pub struct YtDlpBackend {
    extractor: InfoExtractorOrchestrator,
    config: ExtractorConfig,
    format_preferences: Vec<String>,
    random: Arc<dyn RandomSource>,
}

impl YtDlpBackend {
    pub fn new(
        extractor: InfoExtractorOrchestrator,
        config: ExtractorConfig,
        format_preferences: Vec<String>,
        random: Arc<dyn RandomSource>,
    ) -> Self {
        let format_preferences = if format_preferences.is_empty() {
            DEFAULT_FORMAT_PREFERENCES.iter().map(|f| f.to_string()).collect()
        } else {
            format_preferences
        };

        Self {
            extractor,
            config,
            format_preferences,
            random,
        }
    }

    fn watch_url(id: &ContentIdentifier) -> String {
        format!("{}{}", WATCH_URL_BASE, id)
    }

    fn to_search_result(&self, entry: &YtDlpEntry) -> Option<SearchResult> {
        let id = entry.id.as_deref().filter(|id| !id.is_empty())?;
        Some(SearchResult {
            identifier: ContentIdentifier::new(id),
            title: entry.title.clone().unwrap_or_else(|| "Untitled".to_string()),
            thumbnail: entry.best_thumbnail(),
            duration: entry.duration.map(|d| d.max(0.0).round() as u64),
            view_count: entry.view_count,
            source_provider: self.name().to_string(),
        })
    }

    /// Renditions yt-dlp picked for the active `-f` selector
    fn selected_renditions(info: &YtDlpInfo) -> Vec<Rendition> {
        match &info.requested_formats {
            Some(requested) if !requested.is_empty() => {
                requested.iter().filter_map(to_rendition).collect()
            }
            _ => to_rendition(&info.selected).into_iter().collect(),
        }
    }

    async fn resolve_with_preferences(
        &self,
        id: &ContentIdentifier,
    ) -> Result<Option<ResolvedStream>, BackendError> {
        let url = Self::watch_url(id);

        for preference in &self.format_preferences {
            let request = ExtractRequest::page(url.as_str()).with_format(preference.as_str());

            let info = match self.extractor.extract(&request, &self.config).await {
                Ok(info) => info,
                Err(BackendError::FormatUnavailable(_)) => {
                    tracing::debug!(%id, format = %preference, "format preference unavailable");
                    continue;
                }
                Err(e) => return Err(e),
            };

            let renditions = Self::selected_renditions(&info);
            if let Some(rendition) = FormatSelector::select(&renditions) {
                tracing::debug!(
                    %id,
                    format = %preference,
                    category = ?rendition.mime_category,
                    bitrate = rendition.bitrate,
                    "selected rendition"
                );
                return Ok(Some(ResolvedStream {
                    stream_url: rendition.url.clone(),
                    title: info.title.clone().unwrap_or_else(|| "Untitled".to_string()),
                    source_provider: self.name().to_string(),
                }));
            }
        }

        // Every preference came back empty or unavailable
        Ok(None)
    }
}

fn to_rendition(format: &YtDlpFormat) -> Option<Rendition> {
    let url = format.url.as_deref().filter(|u| !u.is_empty())?;
    let mime_category =
        MimeCategory::from_codecs(format.vcodec.as_deref(), format.acodec.as_deref());
    let bitrate = match mime_category {
        MimeCategory::Audio => format.abr.or(format.tbr),
        _ => format.tbr.or(format.abr),
    }
    .unwrap_or(0.0);

    Some(Rendition {
        url: url.to_string(),
        mime_category,
        bitrate,
        container_ext: format.ext.clone(),
        height: format.height,
    })
}

#[async_trait]
impl Backend for YtDlpBackend {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    async fn search(&self, query: &str, limit: usize) -> BackendResult<Vec<SearchResult>> {
        let request = ExtractRequest::search(query, limit);
        let result = self.extractor.extract(&request, &self.config).await.map(|info| {
            info.entries
                .unwrap_or_default()
                .iter()
                .filter_map(|entry| self.to_search_result(entry))
                .take(limit)
                .collect::<Vec<_>>()
        });
        BackendResult::from(result).non_empty()
    }

    async fn resolve_stream(&self, id: &ContentIdentifier) -> BackendResult<ResolvedStream> {
        BackendResult::from_optional(self.resolve_with_preferences(id).await)
    }

    async fn resolve_related(&self, id: &ContentIdentifier) -> BackendResult<SearchResult> {
        let request = ExtractRequest::page(Self::watch_url(id));
        let related = self.extractor.extract(&request, &self.config).await.map(|info| {
            let candidates: Vec<SearchResult> = info
                .related_videos
                .unwrap_or_default()
                .iter()
                .filter_map(|entry| self.to_search_result(entry))
                .collect();
            choose(self.random.as_ref(), &candidates).cloned()
        });
        BackendResult::from_optional(related)
    }
}
