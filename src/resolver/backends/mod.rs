// Extraction backends
//
// - ytdlp: primary, authoritative extractor
// - mirror: Invidious-style public mirrors, used as secondaries

pub mod mirror;
pub mod ytdlp;

pub use mirror::MirrorBackend;
pub use ytdlp::{YtDlpBackend, DEFAULT_FORMAT_PREFERENCES};
