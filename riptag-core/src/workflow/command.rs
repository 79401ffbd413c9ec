use std::sync::Arc;

use crate::{
    error::WorkflowError,
    model::{Candidate, DownloadPlan, DownloadReport, ToolPaths},
};

/// A background operation requested by the controller.
#[derive(Debug, Clone)]
pub enum Command {
    /// Locate yt-dlp and ffmpeg.
    CheckDependencies,
    /// Describe the video behind a pasted URL.
    ResolveUrl {
        /// Located executables.
        tools: ToolPaths,
        /// The URL as typed.
        url: String,
    },
    /// Video search and release search run side by side.
    Search {
        /// Located executables.
        tools: ToolPaths,
        /// Free text as typed.
        query: String,
    },
    /// MusicBrainz release search for the chosen video.
    SearchReleases {
        /// Built from the video title and uploader.
        query: String,
    },
    /// Track list of one release.
    FetchTracks {
        /// MusicBrainz release id.
        release_id: String,
    },
    /// One download attempt.
    Download(DownloadPlan),
}

/// Payload-free tag of a [`Command`], used to match completions to the
/// command that is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum CommandKind {
    CheckDependencies,
    ResolveUrl,
    Search,
    SearchReleases,
    FetchTracks,
    Download,
}

impl Command {
    /// The tag this command's completion will carry.
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::CheckDependencies => CommandKind::CheckDependencies,
            Command::ResolveUrl { .. } => CommandKind::ResolveUrl,
            Command::Search { .. } => CommandKind::Search,
            Command::SearchReleases { .. } => CommandKind::SearchReleases,
            Command::FetchTracks { .. } => CommandKind::FetchTracks,
            Command::Download(_) => CommandKind::Download,
        }
    }
}

/// Output of [`Command::Search`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResults {
    /// Playable sources.
    pub videos: Vec<Arc<Candidate>>,
    /// Releases suggested by the same query. Empty when that lookup failed.
    pub releases: Vec<Arc<Candidate>>,
}

/// The single message a dispatched command sends back. Each variant holds
/// either a payload or one error, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum Completion {
    Dependencies(Result<ToolPaths, WorkflowError>),
    UrlResolved(Result<Arc<Candidate>, WorkflowError>),
    SearchFinished(Result<SearchResults, WorkflowError>),
    ReleasesFound(Result<Vec<Arc<Candidate>>, WorkflowError>),
    TracksFetched(Result<Vec<Arc<Candidate>>, WorkflowError>),
    DownloadFinished(Result<DownloadReport, WorkflowError>),
}

impl Completion {
    /// Which command produced this.
    pub fn kind(&self) -> CommandKind {
        match self {
            Completion::Dependencies(_) => CommandKind::CheckDependencies,
            Completion::UrlResolved(_) => CommandKind::ResolveUrl,
            Completion::SearchFinished(_) => CommandKind::Search,
            Completion::ReleasesFound(_) => CommandKind::SearchReleases,
            Completion::TracksFetched(_) => CommandKind::FetchTracks,
            Completion::DownloadFinished(_) => CommandKind::Download,
        }
    }

    /// The failure message for `kind`, used when the task itself died.
    pub fn failed(kind: CommandKind, error: WorkflowError) -> Self {
        match kind {
            CommandKind::CheckDependencies => {
                Completion::Dependencies(Err(error))
            }
            CommandKind::ResolveUrl => Completion::UrlResolved(Err(error)),
            CommandKind::Search => Completion::SearchFinished(Err(error)),
            CommandKind::SearchReleases => Completion::ReleasesFound(Err(error)),
            CommandKind::FetchTracks => Completion::TracksFetched(Err(error)),
            CommandKind::Download => Completion::DownloadFinished(Err(error)),
        }
    }
}
