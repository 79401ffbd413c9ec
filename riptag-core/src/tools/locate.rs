use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::{error::ToolError, model::ToolPaths};

/// Executable name of the extractor.
pub const EXTRACTOR: &str = "yt-dlp";
/// Executable name of the transcoder.
pub const TRANSCODER: &str = "ffmpeg";

const EXTRACTOR_HINT: &str = "Put yt-dlp on your PATH or place the \
                              executable in the working directory.";
const TRANSCODER_HINT: &str = "ffmpeg is required for audio conversion. \
                               Install it for your OS (for example \
                               `brew install ffmpeg` or `apt install ffmpeg`).";

/// Resolve both tools. Overrides win; otherwise the extractor is looked up
/// on `PATH` and then in `working_dir`, the transcoder only on `PATH`.
pub fn locate_tools(
    extractor_override: Option<&Path>,
    transcoder_override: Option<&Path>,
    working_dir: &Path,
) -> Result<ToolPaths, ToolError> {
    let extractor = locate_extractor(extractor_override, working_dir)?;
    let transcoder = locate_transcoder(transcoder_override)?;
    info!(
        extractor = %extractor.display(),
        transcoder = %transcoder.display(),
        "external tools located"
    );
    Ok(ToolPaths {
        extractor,
        transcoder,
    })
}

fn locate_extractor(
    explicit: Option<&Path>,
    working_dir: &Path,
) -> Result<PathBuf, ToolError> {
    let not_found = ToolError::NotFound {
        tool: EXTRACTOR,
        hint: EXTRACTOR_HINT,
    };

    if let Some(path) = explicit {
        return which::which(path).map_err(|_| not_found);
    }
    if let Ok(path) = which::which(EXTRACTOR) {
        return Ok(path);
    }

    let local = working_dir
        .join(format!("{EXTRACTOR}{}", std::env::consts::EXE_SUFFIX));
    debug!(path = %local.display(), "probing for a local extractor");
    if local.is_file() {
        Ok(local)
    } else {
        Err(not_found)
    }
}

fn locate_transcoder(explicit: Option<&Path>) -> Result<PathBuf, ToolError> {
    let target = explicit.unwrap_or(Path::new(TRANSCODER));
    which::which(target).map_err(|_| ToolError::NotFound {
        tool: TRANSCODER,
        hint: TRANSCODER_HINT,
    })
}
