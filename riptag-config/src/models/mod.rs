//! Resolved configuration handed to the rest of the application.

pub mod layout;
pub mod sources;

use layout::AppLayout;

use std::{path::PathBuf, time::Duration};

/// Fully resolved settings. Every field has a value once loading succeeds.
#[derive(Debug, Clone)]
pub struct Config {
    /// Application root and its subdirectories.
    pub layout: AppLayout,
    /// Executable overrides for yt-dlp and ffmpeg.
    pub tools: ToolOverrides,
    /// Per-call time limits.
    pub timeouts: Timeouts,
    /// Result counts.
    pub search: SearchLimits,
    /// HTTP client settings.
    pub http: HttpSettings,
    /// Log filter.
    pub logging: LoggingSettings,
    /// Where the values came from.
    pub metadata: ConfigMetadata,
}

impl Config {
    /// See [`AppLayout::ensure_directories`].
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        self.layout.ensure_directories()
    }
}

/// Explicit executable locations. `None` means discover at startup.
#[derive(Debug, Clone, Default)]
pub struct ToolOverrides {
    /// yt-dlp.
    pub extractor: Option<PathBuf>,
    /// ffmpeg.
    pub transcoder: Option<PathBuf>,
}

/// Upper bounds for every external call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Quick extractor calls: search and URL resolution.
    pub tool: Duration,
    /// Audio extraction.
    pub download: Duration,
    /// Final FLAC merge.
    pub transcode: Duration,
    /// Each catalog request.
    pub http: Duration,
}

/// How many results each search asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchLimits {
    /// Videos per free-text search.
    pub videos: u32,
    /// Releases per MusicBrainz search.
    pub releases: u32,
}

/// Settings shared by every catalog client.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    /// Sent with every request.
    pub user_agent: String,
}

/// Diagnostic log settings.
#[derive(Debug, Clone)]
pub struct LoggingSettings {
    /// `EnvFilter` directive string, e.g. `info` or `riptag_core=debug`.
    pub level: String,
}

/// Provenance of a loaded [`Config`].
#[derive(Debug, Clone, Default)]
pub struct ConfigMetadata {
    /// The TOML file that was read, if any.
    pub config_path: Option<PathBuf>,
    /// Whether a `.env` file was applied.
    pub env_file_loaded: bool,
}

/// A non-fatal problem found while loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    /// What was wrong.
    pub message: String,
    /// Suggested fix, shown after the message.
    pub hint: Option<String>,
}

/// Warnings collected in load order.
#[derive(Debug, Default, Clone)]
pub struct ConfigWarnings {
    /// Warnings in the order they were found.
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    /// Record a warning without a hint.
    pub fn push<S: Into<String>>(&mut self, message: S) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    /// Record a warning with a suggested fix.
    pub fn push_with_hint<S: Into<String>, H: Into<String>>(
        &mut self,
        message: S,
        hint: H,
    ) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    /// True when loading raised no warnings.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate in load order.
    pub fn iter(&self) -> impl Iterator<Item = &ConfigWarning> {
        self.items.iter()
    }
}
