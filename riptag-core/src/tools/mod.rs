//! Adapters for the external command-line tools: `yt-dlp` for search,
//! URL resolution and audio extraction, `ffmpeg` for the final merge.

mod command;
mod locate;
mod ytdlp;

pub use command::{CommandLineTools, ToolSettings, merge_args};
pub use locate::{EXTRACTOR, TRANSCODER, locate_tools};

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::{
    error::ToolError,
    model::{Candidate, MergeRequest, ToolPaths},
};

/// Operations the workflow needs from the extraction and transcoding tools.
///
/// Every call carries its own timeout and reports
/// [`ToolError::Timeout`] instead of hanging.
#[async_trait]
pub trait ToolAdapter: Send + Sync {
    /// Find both executables. Failure names the missing tool.
    async fn locate(&self) -> Result<ToolPaths, ToolError>;

    /// Text search returning up to the configured number of videos.
    async fn search_videos(
        &self,
        tools: &ToolPaths,
        query: &str,
    ) -> Result<Vec<Candidate>, ToolError>;

    /// Describe the single video behind a direct URL.
    async fn resolve_url(
        &self,
        tools: &ToolPaths,
        url: &str,
    ) -> Result<Candidate, ToolError>;

    /// Download the best audio stream of `url` to `output`.
    async fn extract_audio(
        &self,
        tools: &ToolPaths,
        url: &str,
        output: &Path,
    ) -> Result<PathBuf, ToolError>;

    /// Transcode to FLAC, embedding cover art and tags when present.
    async fn transcode(
        &self,
        tools: &ToolPaths,
        request: &MergeRequest,
    ) -> Result<(), ToolError>;
}
