// InfoExtractor module - runs yt-dlp for the primary backend
//
// Two modes:
// - Python mode: `python3 -m yt_dlp` (better for YouTube, avoids bot detection)
// - CLI mode: native `yt-dlp` binary (no Python dependency)
//
// The orchestrator picks a mode, falls back between them and retries
// transient failures.

mod cli;
mod diagnostics;
mod orchestrator;
mod python;
mod traits;

pub use cli::CliInfoExtractor;
pub use diagnostics::{classify_failure, diagnose_error, BlockingReason};
pub use orchestrator::InfoExtractorOrchestrator;
pub use python::PythonInfoExtractor;
pub use traits::{
    ExtractRequest, ExtractorConfig, ExtractorMode, InfoExtractor, YtDlpEntry, YtDlpFormat,
    YtDlpInfo,
};
