use std::{fmt, path::PathBuf, sync::Arc};

use super::{Candidate, TagSet};
use crate::error::WorkflowError;

/// Executable locations found by the dependency check. Carried across
/// workflow resets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub extractor: PathBuf,
    pub transcoder: PathBuf,
}

/// How much metadata goes into the output file.
#[derive(Debug, Clone)]
pub enum DownloadMode {
    /// Full metadata path: cover and lyrics are fetched alongside the audio.
    Tagged {
        release: Arc<Candidate>,
        tags: TagSet,
    },
    /// Title-only output with no tags, cover or lyrics.
    Tagless,
}

/// Everything a single download attempt needs.
#[derive(Debug, Clone)]
pub struct DownloadPlan {
    pub tools: ToolPaths,
    pub source: Arc<Candidate>,
    pub mode: DownloadMode,
}

impl DownloadPlan {
    pub fn is_tagless(&self) -> bool {
        matches!(self.mode, DownloadMode::Tagless)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Audio,
    Cover,
    Lyrics,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AssetKind::Audio => "audio",
            AssetKind::Cover => "cover art",
            AssetKind::Lyrics => "lyrics",
        };
        f.write_str(name)
    }
}

/// A non-fatal failure recorded during a fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetError {
    pub kind: AssetKind,
    pub cause: WorkflowError,
}

/// Aggregated result of the concurrent fetch, prior to merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    pub audio_path: PathBuf,
    pub cover_path: Option<PathBuf>,
    pub lyrics: Option<String>,
    pub errors: Vec<AssetError>,
}

/// Input for the transcoder's merge step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeRequest {
    pub audio: PathBuf,
    pub cover: Option<PathBuf>,
    pub metadata: Vec<(String, String)>,
    pub output: PathBuf,
}

/// What a finished attempt produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadReport {
    pub output_path: PathBuf,
    pub cover_embedded: bool,
    pub lyrics_embedded: bool,
    /// Best-effort assets that failed and were left out. Logged only; the
    /// wizard never shows these failures.
    pub skipped_assets: Vec<AssetKind>,
}
