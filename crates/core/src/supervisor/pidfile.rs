//! Pid-file reading and writing.
//!
//! The file holds a single decimal pid followed by a newline. Callers hold
//! the [`PidLock`](super::lock::PidLock) around every read-modify-write.

use super::error::{SupervisorError, SupervisorResult};
use std::io::ErrorKind;
use std::path::Path;

/// What a pid-file currently contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PidFileState {
    Missing,
    /// Present but not a positive integer.
    Invalid,
    Pid(u32),
}

pub fn read_pid(path: &Path) -> SupervisorResult<PidFileState> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(PidFileState::Missing),
        Err(source) => {
            return Err(SupervisorError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    Ok(match content.trim().parse::<u32>() {
        Ok(pid) if pid > 0 => PidFileState::Pid(pid),
        _ => PidFileState::Invalid,
    })
}

pub fn write_pid(path: &Path, pid: u32) -> SupervisorResult<()> {
    std::fs::write(path, format!("{pid}\n")).map_err(|source| SupervisorError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Remove the pid-file; a missing file is not an error.
pub fn remove_pid(path: &Path) -> SupervisorResult<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(source) => Err(SupervisorError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_read_write_remove() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("run.pid");

        assert_eq!(read_pid(&path).expect("read"), PidFileState::Missing);

        write_pid(&path, 4242).expect("write");
        assert_eq!(read_pid(&path).expect("read"), PidFileState::Pid(4242));
        assert_eq!(std::fs::read_to_string(&path).expect("raw"), "4242\n");

        remove_pid(&path).expect("remove");
        remove_pid(&path).expect("removing twice is fine");
        assert_eq!(read_pid(&path).expect("read"), PidFileState::Missing);
    }

    #[test]
    fn test_invalid_content() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("run.pid");

        for content in ["", "abc", "0", "-5"] {
            std::fs::write(&path, content).expect("write");
            assert_eq!(read_pid(&path).expect("read"), PidFileState::Invalid, "{content:?}");
        }
    }
}
