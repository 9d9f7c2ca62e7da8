// Locator parser - extracts a content identifier from a page URL
//
// Recognized shapes:
// - watch URLs carrying the id in the `v` query parameter
// - short links carrying the id as the final path segment
//   (youtu.be/ID, /shorts/ID, /embed/ID, /live/ID)

use lazy_static::lazy_static;
use regex::Regex;
use url::Url;

use super::models::ContentIdentifier;

lazy_static! {
    static ref IDENTIFIER_RE: Regex = Regex::new(r"^[A-Za-z0-9_-]+$").unwrap();
}

/// Path segments that name a page kind rather than an item
const RESERVED_SEGMENTS: &[&str] = &[
    "watch", "shorts", "embed", "live", "v", "results", "playlist", "channel", "feed", "user", "c",
];

/// Extract the identifier, or `None` when the URL shape is not recognized
pub fn parse(locator: &str) -> Option<ContentIdentifier> {
    let trimmed = locator.trim();
    if trimmed.is_empty() {
        return None;
    }

    let url = Url::parse(trimmed)
        .or_else(|_| Url::parse(&format!("https://{}", trimmed)))
        .ok()?;

    if let Some((_, v)) = url.query_pairs().find(|(key, _)| key == "v") {
        return valid_identifier(&v);
    }

    let last = url
        .path_segments()?
        .filter(|segment| !segment.is_empty())
        .last()?;

    if RESERVED_SEGMENTS.contains(&last) {
        return None;
    }

    valid_identifier(last)
}

fn valid_identifier(candidate: &str) -> Option<ContentIdentifier> {
    IDENTIFIER_RE
        .is_match(candidate)
        .then(|| ContentIdentifier::new(candidate))
}
