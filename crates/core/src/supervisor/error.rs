//! Error types for background supervision.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the supervisor.
#[derive(Error, Debug)]
pub enum SupervisorError {
    /// A live process is already recorded in the pid-file.
    #[error("A background run is already active (pid {pid}, pid-file {pidfile})")]
    AlreadyRunning { pid: u32, pidfile: PathBuf },

    /// `stop` was asked for but no live background run exists.
    #[error("No background run is active (pid-file {pidfile})")]
    NotRunning { pidfile: PathBuf },

    /// The pid-file lock could not be taken.
    #[error("Failed to lock {path}: {source}")]
    LockFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The detached process could not be started.
    #[error("Failed to start background process '{program}': {source}")]
    Spawn {
        program: PathBuf,
        source: std::io::Error,
    },

    /// Sending a signal to the recorded process failed.
    #[error("Failed to signal pid {pid}: {source}")]
    Signal { pid: u32, source: nix::Error },

    /// Reading or writing the pid-file or background log failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type SupervisorResult<T> = Result<T, SupervisorError>;
