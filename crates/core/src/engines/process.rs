//! Engine subprocess execution.
//!
//! Spawns an [`EngineCommand`] in its own process group, merges its stdout
//! and stderr line by line into the job log, and enforces the per-job
//! timeout. The job is classified by the engine's exit status; whatever the
//! engine leaves behind in its group is killed before the next job starts.

use crate::engines::base::EngineCommand;
use crate::supervisor::process::kill_group;
use bb_protocol::ipc::Event;
use chrono::Local;
use std::io;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio_stream::wrappers::SplitStream;
use tokio_stream::StreamExt;
use tracing::{debug, warn};

/// Prefix of lines the executor itself writes into a job log.
pub const LOG_MARKER: &str = "[batchbook]";

/// How long output is still collected after the engine exited.
const DRAIN_GRACE: Duration = Duration::from_secs(2);

/// How an engine process ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessExit {
    /// The process exited; `None` when it was terminated by a signal.
    Exited(Option<i32>),

    /// The timeout elapsed and the process was killed.
    TimedOut,

    /// The program could not be started.
    SpawnFailed(String),
}

/// Where engine output lines are forwarded besides the log file.
#[derive(Debug, Clone)]
pub struct OutputForward {
    pub index: usize,
    pub events_tx: mpsc::Sender<Event>,
}

/// SIGKILLs the engine's process group once, at the latest when dropped.
///
/// Dropping covers a cancelled run (Ctrl-C, `stop`).
struct GroupGuard {
    pgid: Option<u32>,
}

impl GroupGuard {
    fn kill(&mut self) {
        if let Some(pgid) = self.pgid.take() {
            if let Err(e) = kill_group(pgid) {
                warn!(pgid, error = %e, "failed to kill engine process group");
            }
        }
    }
}

impl Drop for GroupGuard {
    fn drop(&mut self) {
        self.kill();
    }
}

/// Runs engine commands to completion.
pub struct ProcessExecutor;

impl ProcessExecutor {
    /// Execute `command`, capturing its output into `log_path`.
    ///
    /// The log is opened in append mode. Spawn failures and timeouts are
    /// recorded in the log and returned as [`ProcessExit`] variants.
    ///
    /// # Errors
    ///
    /// Only I/O errors on the log file itself are returned as `Err`. The
    /// process group is killed before returning one.
    pub async fn run(
        command: &EngineCommand,
        log_path: &Path,
        timeout: Duration,
        forward: Option<OutputForward>,
    ) -> io::Result<ProcessExit> {
        let mut log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)
            .await?;

        write_marker(&mut log, &format!("started at {}", Local::now().to_rfc3339())).await?;
        write_marker(&mut log, &format!("command: {command}")).await?;

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &command.working_dir {
            cmd.current_dir(dir);
        }
        #[cfg(unix)]
        {
            cmd.process_group(0);
        }

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                let message = format!("failed to start '{}': {e}", command.program);
                write_marker(&mut log, &message).await?;
                return Ok(ProcessExit::SpawnFailed(message));
            }
        };
        let mut group = GroupGuard { pgid: child.id() };
        debug!(pid = ?child.id(), program = %command.program, "engine process spawned");

        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            group.kill();
            return Err(io::Error::new(
                io::ErrorKind::Other,
                "engine output pipes were not captured",
            ));
        };

        let (exit, captured) = {
            let capture = capture_output(stdout, stderr, &mut log, forward.as_ref());
            tokio::pin!(capture);
            let mut captured = None;

            let waited = tokio::time::timeout(timeout, async {
                loop {
                    tokio::select! {
                        status = child.wait() => break status,
                        result = &mut capture, if captured.is_none() => captured = Some(result),
                    }
                }
            })
            .await;

            let exit = match waited {
                Ok(Ok(status)) => ProcessExit::Exited(status.code()),
                Ok(Err(e)) => {
                    group.kill();
                    return Err(e);
                }
                Err(_) => ProcessExit::TimedOut,
            };

            // Descendants still holding the pipes die with the group, which
            // closes the pipes and ends the capture.
            group.kill();
            if exit == ProcessExit::TimedOut {
                if let Err(e) = child.kill().await {
                    warn!(error = %e, "failed to reap timed out engine process");
                }
            }

            if captured.is_none() {
                match tokio::time::timeout(DRAIN_GRACE, &mut capture).await {
                    Ok(result) => captured = Some(result),
                    Err(_) => warn!("engine output still open after exit, rest of it dropped"),
                }
            }
            (exit, captured)
        };
        if let Some(Err(e)) = captured {
            return Err(e);
        }

        let footer = match &exit {
            ProcessExit::Exited(Some(code)) => format!("exited with code {code}"),
            ProcessExit::Exited(None) => "terminated by signal".to_string(),
            ProcessExit::TimedOut => {
                format!("Timeout: exceeded {}s, process killed", timeout.as_secs())
            }
            ProcessExit::SpawnFailed(message) => message.clone(),
        };
        write_marker(&mut log, &footer).await?;
        log.flush().await?;

        Ok(exit)
    }
}

/// Copy both output streams into `log` until they close.
///
/// Lines go to the log as raw bytes; forwarded events get a lossy UTF-8
/// rendering.
async fn capture_output(
    stdout: impl AsyncRead + Unpin,
    stderr: impl AsyncRead + Unpin,
    log: &mut File,
    forward: Option<&OutputForward>,
) -> io::Result<()> {
    let stdout_lines = SplitStream::new(BufReader::new(stdout).split(b'\n'));
    let stderr_lines = SplitStream::new(BufReader::new(stderr).split(b'\n'));
    let mut merged = stdout_lines.merge(stderr_lines);

    while let Some(line) = merged.next().await {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "engine output could not be read");
                break;
            }
        };
        log.write_all(&line).await?;
        log.write_all(b"\n").await?;
        if let Some(forward) = forward {
            let _ = forward
                .events_tx
                .send(Event::JobOutput {
                    index: forward.index,
                    line: String::from_utf8_lossy(&line).into_owned(),
                })
                .await;
        }
    }
    Ok(())
}

async fn write_marker(log: &mut File, message: &str) -> io::Result<()> {
    log.write_all(format!("{LOG_MARKER} {message}\n").as_bytes())
        .await
}
