//! Advisory lock serializing pid-file access.
//!
//! The lock lives next to the pid-file (`<pidfile>.lock`) so the pid-file
//! itself can be created and removed freely while the lock is held.

use super::error::{SupervisorError, SupervisorResult};
use fs2::FileExt;
use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Exclusive lock held for the duration of a pid-file operation.
#[derive(Debug)]
pub struct PidLock {
    file: File,
    path: PathBuf,
}

impl PidLock {
    /// Block until the lock for `pidfile` is held.
    pub fn acquire(pidfile: &Path) -> SupervisorResult<Self> {
        let path = lock_path_for(pidfile);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| SupervisorError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        // Never truncate: the file carries no data, but another holder may
        // have it open.
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|source| SupervisorError::Io {
                path: path.clone(),
                source,
            })?;
        file.lock_exclusive()
            .map_err(|source| SupervisorError::LockFailed {
                path: path.clone(),
                source,
            })?;

        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PidLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!(path = %self.path.display(), error = %e, "failed to release pid-file lock");
        }
    }
}

/// `<pidfile>.lock`
pub fn lock_path_for(pidfile: &Path) -> PathBuf {
    let mut name = OsString::from(pidfile.as_os_str());
    name.push(".lock");
    PathBuf::from(name)
}
