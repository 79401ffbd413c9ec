use std::path::Path;

use tempfile::TempDir;
use tracing::{debug, warn};

use crate::error::WorkflowError;

const SCRATCH_PREFIX: &str = "riptag_";

/// Per-attempt temporary directory.
///
/// Removal is tied to ownership: dropping the value deletes the directory
/// and everything in it, whichever way the attempt ends.
#[derive(Debug)]
pub struct ScratchArea {
    dir: TempDir,
}

impl ScratchArea {
    /// A fresh `riptag_*` directory under `parent`, creating `parent` if
    /// needed.
    pub fn create(parent: &Path) -> Result<Self, WorkflowError> {
        std::fs::create_dir_all(parent).map_err(|err| {
            WorkflowError::Scratch(format!("{}: {err}", parent.display()))
        })?;
        let dir = tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir_in(parent)
            .map_err(|err| {
                WorkflowError::Scratch(format!("{}: {err}", parent.display()))
            })?;
        debug!(path = %dir.path().display(), "scratch area created");
        Ok(Self { dir })
    }

    /// Location of the directory while it exists.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Remove now and log a failure instead of ignoring it silently.
    pub fn close(self) {
        let path = self.dir.path().to_path_buf();
        match self.dir.close() {
            Ok(()) => debug!(path = %path.display(), "scratch area removed"),
            Err(err) => warn!(
                path = %path.display(),
                error = %err,
                "failed to remove scratch area"
            ),
        }
    }
}
