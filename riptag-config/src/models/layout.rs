//! Directory layout under the application root.

use std::path::{Path, PathBuf};

use crate::constants::{LOG_FILE, LOGS_DIR, OUTPUT_DIR, SCRATCH_DIR};

/// On-disk layout rooted at the application directory.
///
/// `downloads` receives finished files, `temp` holds one scratch area per
/// in-flight attempt and `logs` receives the diagnostic log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppLayout {
    root: PathBuf,
}

impl AppLayout {
    /// Layout rooted at `root`. Nothing is created until
    /// [`AppLayout::ensure_directories`].
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The application root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where finished FLAC files land.
    pub fn output_dir(&self) -> PathBuf {
        self.root.join(OUTPUT_DIR)
    }

    /// Parent of every per-attempt scratch area.
    pub fn scratch_dir(&self) -> PathBuf {
        self.root.join(SCRATCH_DIR)
    }

    /// Holds the diagnostic log.
    pub fn logs_dir(&self) -> PathBuf {
        self.root.join(LOGS_DIR)
    }

    /// Full path of the diagnostic log file.
    pub fn log_file(&self) -> PathBuf {
        self.logs_dir().join(LOG_FILE)
    }

    /// Create the root and its three subdirectories if they are missing.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        for dir in [
            self.root.clone(),
            self.output_dir(),
            self.scratch_dir(),
            self.logs_dir(),
        ] {
            std::fs::create_dir_all(&dir)?;
        }
        Ok(())
    }
}
