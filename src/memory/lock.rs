//! Per-session single-writer lock.
//!
//! An advisory exclusive lock on `<session_dir>/.lock` serializes writers of
//! one session across processes. The lock is released on drop.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;

pub const LOCK_FILE: &str = ".lock";

#[derive(Debug)]
pub struct SessionLock {
    file: File,
    path: PathBuf,
}

impl SessionLock {
    fn open(session_dir: &Path) -> std::io::Result<(File, PathBuf)> {
        std::fs::create_dir_all(session_dir)?;
        let path = session_dir.join(LOCK_FILE);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;
        Ok((file, path))
    }

    /// Block until the session lock is held.
    pub fn acquire(session_dir: &Path) -> std::io::Result<Self> {
        let (file, path) = Self::open(session_dir)?;
        file.lock_exclusive()?;
        tracing::debug!(path = %path.display(), "session lock acquired");
        Ok(Self { file, path })
    }

    /// Take the lock only if no other writer holds it.
    pub fn try_acquire(session_dir: &Path) -> std::io::Result<Option<Self>> {
        let (file, path) = Self::open(session_dir)?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(Self { file, path })),
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Whether another handle currently holds the lock. A session directory
    /// that does not exist yet has no writer.
    pub fn writer_active(session_dir: &Path) -> std::io::Result<bool> {
        if !session_dir.is_dir() {
            return Ok(false);
        }
        Ok(Self::try_acquire(session_dir)?.is_none())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SessionLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to release session lock");
        }
    }
}
