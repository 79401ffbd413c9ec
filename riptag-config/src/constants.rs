//! Built-in defaults and directory names.

use std::time::Duration;

/// Directory created under the working directory when no root is configured.
pub const DEFAULT_ROOT_DIR: &str = "riptag";
/// Finished files.
pub const OUTPUT_DIR: &str = "downloads";
/// Per-attempt scratch areas.
pub const SCRATCH_DIR: &str = "temp";
/// Diagnostic log directory.
pub const LOGS_DIR: &str = "logs";
/// Log file name inside [`LOGS_DIR`].
pub const LOG_FILE: &str = "riptag.log";

/// Search and URL resolution.
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(30);
/// Audio extraction gets twice the budget of the quick tool calls.
pub const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);
/// Final merge into FLAC.
pub const DEFAULT_TRANSCODE_TIMEOUT: Duration = Duration::from_secs(120);
/// Per request, for every catalog lookup.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Videos requested per free-text search.
pub const DEFAULT_VIDEO_RESULTS: u32 = 5;
/// Releases requested per MusicBrainz search.
pub const DEFAULT_RELEASE_RESULTS: u32 = 25;

/// `EnvFilter` directive used when nothing else is configured.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// MusicBrainz asks every client to identify itself.
pub fn default_user_agent() -> String {
    format!(
        "riptag/{} ( https://musicbrainz.org/doc/MusicBrainz_API )",
        env!("CARGO_PKG_VERSION")
    )
}
