//! Background run supervision.
//!
//! A background run is a detached batchbook process recorded in a pid-file.
//! At most one may be active per pid-file; every check-then-act sequence
//! on the pid-file happens under an exclusive [`PidLock`].
//!
//! ```text
//! start   lock -> live pid? AlreadyRunning : (remove stale) spawn, write pid
//! release lock -> pid-file still ours? remove
//! stop    lock -> live pid? SIGTERM to its process group : NotRunning
//! ```

pub mod error;
pub mod lock;
pub mod pidfile;
pub mod process;

pub use error::{SupervisorError, SupervisorResult};
pub use lock::PidLock;

use pidfile::{read_pid, remove_pid, write_pid, PidFileState};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use tracing::{info, warn};

/// The command line a background run executes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,

    /// Receives stdout and stderr of the detached process, appended.
    pub log_file: PathBuf,

    pub current_dir: Option<PathBuf>,
}

/// State of the background run recorded in a pid-file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackgroundStatus {
    Running { pid: u32 },
    /// The pid-file names a process that no longer exists.
    Stale { pid: u32 },
    NotRunning,
}

/// A started background process.
#[derive(Debug)]
pub struct ProcessHandle {
    pid: u32,
    pidfile: PathBuf,
    child: Option<Child>,
}

impl ProcessHandle {
    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn pidfile(&self) -> &Path {
        &self.pidfile
    }

    pub fn is_alive(&self) -> bool {
        process::is_alive(self.pid)
    }

    /// Wait for the process to exit. Only possible from the starting process.
    pub fn wait(&mut self) -> std::io::Result<Option<ExitStatus>> {
        match self.child.as_mut() {
            Some(child) => child.wait().map(Some),
            None => Ok(None),
        }
    }
}

/// Guards the background run recorded in one pid-file.
#[derive(Debug, Clone)]
pub struct Supervisor {
    pidfile: PathBuf,
}

impl Supervisor {
    pub fn new(pidfile: impl Into<PathBuf>) -> Self {
        Self {
            pidfile: pidfile.into(),
        }
    }

    pub fn pidfile(&self) -> &Path {
        &self.pidfile
    }

    /// Start `invocation` detached from the caller.
    ///
    /// The child gets its own process group, a null stdin and the log file
    /// as stdout and stderr, so it survives the terminal closing.
    ///
    /// # Errors
    ///
    /// [`SupervisorError::AlreadyRunning`] when the pid-file names a live
    /// process. A stale pid-file is reclaimed with a warning.
    pub fn start(&self, invocation: &Invocation) -> SupervisorResult<ProcessHandle> {
        let _lock = PidLock::acquire(&self.pidfile)?;

        match read_pid(&self.pidfile)? {
            PidFileState::Pid(pid) if process::is_alive(pid) => {
                return Err(SupervisorError::AlreadyRunning {
                    pid,
                    pidfile: self.pidfile.clone(),
                });
            }
            PidFileState::Pid(pid) => {
                warn!(pid, pidfile = %self.pidfile.display(), "reclaiming stale pid-file");
                remove_pid(&self.pidfile)?;
            }
            PidFileState::Invalid => {
                warn!(pidfile = %self.pidfile.display(), "removing unreadable pid-file");
                remove_pid(&self.pidfile)?;
            }
            PidFileState::Missing => {}
        }

        let child = spawn_detached(invocation)?;
        let pid = child.id();

        if let Err(e) = write_pid(&self.pidfile, pid) {
            // Unrecorded runs could never be stopped or detected.
            let _ = process::terminate(pid);
            return Err(e);
        }

        info!(pid, log = %invocation.log_file.display(), "background run started");
        Ok(ProcessHandle {
            pid,
            pidfile: self.pidfile.clone(),
            child: Some(child),
        })
    }

    /// Remove the pid-file if it still records `pid`.
    ///
    /// Called by the background process itself when its run ends. Returns
    /// whether the file was removed.
    pub fn release(&self, pid: u32) -> SupervisorResult<bool> {
        let _lock = PidLock::acquire(&self.pidfile)?;

        match read_pid(&self.pidfile)? {
            PidFileState::Pid(recorded) if recorded == pid => {
                remove_pid(&self.pidfile)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Ask the recorded background run to terminate.
    ///
    /// Sends SIGTERM and returns the pid without waiting for the process to
    /// exit. A stale pid-file is removed.
    pub fn stop(&self) -> SupervisorResult<u32> {
        let _lock = PidLock::acquire(&self.pidfile)?;

        match read_pid(&self.pidfile)? {
            PidFileState::Pid(pid) if process::is_alive(pid) => {
                process::terminate(pid).map_err(|source| SupervisorError::Signal { pid, source })?;
                info!(pid, "sent SIGTERM to background run");
                Ok(pid)
            }
            PidFileState::Pid(_) | PidFileState::Invalid => {
                remove_pid(&self.pidfile)?;
                Err(SupervisorError::NotRunning {
                    pidfile: self.pidfile.clone(),
                })
            }
            PidFileState::Missing => Err(SupervisorError::NotRunning {
                pidfile: self.pidfile.clone(),
            }),
        }
    }

    /// Report the recorded background run without changing anything.
    pub fn status(&self) -> SupervisorResult<BackgroundStatus> {
        Ok(match read_pid(&self.pidfile)? {
            PidFileState::Pid(pid) if process::is_alive(pid) => BackgroundStatus::Running { pid },
            PidFileState::Pid(pid) => BackgroundStatus::Stale { pid },
            PidFileState::Invalid | PidFileState::Missing => BackgroundStatus::NotRunning,
        })
    }
}

fn spawn_detached(invocation: &Invocation) -> SupervisorResult<Child> {
    let log_path = &invocation.log_file;
    if let Some(parent) = log_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| SupervisorError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let io_err = |source: std::io::Error| SupervisorError::Io {
        path: log_path.clone(),
        source,
    };
    let stdout = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .map_err(io_err)?;
    let stderr = stdout.try_clone().map_err(io_err)?;

    let mut cmd = Command::new(&invocation.program);
    cmd.args(&invocation.args)
        .stdin(Stdio::null())
        .stdout(Stdio::from(stdout))
        .stderr(Stdio::from(stderr));
    if let Some(dir) = &invocation.current_dir {
        cmd.current_dir(dir);
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }

    cmd.spawn().map_err(|source| SupervisorError::Spawn {
        program: invocation.program.clone(),
        source,
    })
}
