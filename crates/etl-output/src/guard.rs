//! Scoped ownership of an output path.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

/// Owns an output path for the duration of a write.
///
/// The guard is created before the first byte is written and removes the
/// file on drop unless [`OutputGuard::commit`] is called, so every
/// non-success exit path (early return, error, panic) cleans up the
/// partial file.
#[derive(Debug)]
pub struct OutputGuard {
    path: PathBuf,
    armed: bool,
}

impl OutputGuard {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            armed: true,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Mark the write as successful; the file is kept.
    pub fn commit(mut self) {
        self.armed = false;
    }
}

impl Drop for OutputGuard {
    fn drop(&mut self) {
        if self.armed && self.path.exists() {
            debug!(path = %self.path.display(), "removing partial output");
            if let Err(error) = fs::remove_file(&self.path) {
                debug!(
                    path = %self.path.display(),
                    %error,
                    "failed to remove partial output"
                );
            }
        }
    }
}
