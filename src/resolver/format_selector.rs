// FormatSelector - picks one rendition out of what a provider exposes
//
// Policy:
// - highest-bitrate audio-only rendition (smallest bandwidth for playback)
// - otherwise highest-bitrate rendition of any category
// - ties keep the earliest entry

use super::models::{MimeCategory, Rendition};

pub struct FormatSelector;

impl FormatSelector {
    /// Select the preferred rendition, `None` for an empty list
    pub fn select(renditions: &[Rendition]) -> Option<&Rendition> {
        Self::highest_bitrate(
            renditions
                .iter()
                .filter(|r| r.mime_category == MimeCategory::Audio),
        )
        .or_else(|| Self::highest_bitrate(renditions.iter()))
    }

    /// First entry with the maximal bitrate
    fn highest_bitrate<'a>(candidates: impl Iterator<Item = &'a Rendition>) -> Option<&'a Rendition> {
        candidates.fold(None, |best: Option<&Rendition>, candidate| match best {
            Some(current) if candidate.bitrate.total_cmp(&current.bitrate).is_le() => Some(current),
            _ => Some(candidate),
        })
    }
}
