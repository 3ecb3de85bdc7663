//! Pid file guard.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Pid file written before serving and removed when the guard drops.
#[derive(Debug)]
pub struct Pidfile {
    path: PathBuf,
}

impl Pidfile {
    /// Write the current process id to `path`.
    ///
    /// # Errors
    ///
    /// Any I/O failure creating or writing the file.
    pub fn create(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        fs::write(&path, format!("{}\n", std::process::id()))?;
        tracing::debug!(path = %path.display(), "pid file written");
        Ok(Self { path })
    }

    /// Where the pid file lives.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for Pidfile {
    fn drop(&mut self) {
        if let Err(err) = fs::remove_file(&self.path) {
            tracing::warn!(path = %self.path.display(), %err, "failed to remove pid file");
        }
    }
}
