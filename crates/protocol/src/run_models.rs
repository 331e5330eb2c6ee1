//! Runtime models for a batch run.
//!
//! This module defines the records produced while a run progresses:
//! per-job results, the run session that accumulates them, and the final
//! summary that decides the process exit code.

use crate::job_models::{JobItem, RunId};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Default per-job timeout: one hour.
pub const DEFAULT_TIMEOUT_SECS: u64 = 3600;

/// Exit code when every job succeeded.
pub const EXIT_SUCCESS: i32 = 0;

/// Exit code when at least one job failed or the run halted early.
pub const EXIT_FAILURE: i32 = 1;

/// Final classification of an attempted job.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobOutcome {
    Succeeded,
    Failed,
}

/// Why a job was classified as failed.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    /// The engine exited with a nonzero code, or was killed by a signal
    /// (`exit_code` is `None` in that case).
    ExecutionFailure { exit_code: Option<i32> },

    /// The job exceeded the per-job timeout and was killed.
    Timeout { after_secs: u64 },

    /// Output or log locations could not be prepared.
    Setup { message: String },

    /// The engine executable could not be started.
    Spawn { message: String },

    /// The job input does not exist; the engine was never invoked.
    InputNotFound,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExecutionFailure {
                exit_code: Some(code),
            } => write!(f, "engine exited with code {code}"),
            Self::ExecutionFailure { exit_code: None } => {
                f.write_str("engine terminated by signal")
            }
            Self::Timeout { after_secs } => write!(f, "timed out after {after_secs}s"),
            Self::Setup { message } => write!(f, "setup failed: {message}"),
            Self::Spawn { message } => write!(f, "could not start engine: {message}"),
            Self::InputNotFound => f.write_str("input not found"),
        }
    }
}

/// The record of one attempted job.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct JobResult {
    pub item: JobItem,
    pub outcome: JobOutcome,

    /// Set when `outcome` is `Failed`.
    pub reason: Option<FailureReason>,

    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,

    /// Exit code of the engine process, when it exited normally.
    pub exit_code: Option<i32>,
}

impl JobResult {
    pub fn is_success(&self) -> bool {
        self.outcome == JobOutcome::Succeeded
    }

    pub fn duration(&self) -> Duration {
        (self.finished_at - self.started_at)
            .to_std()
            .unwrap_or_default()
    }
}

/// Failure handling and timeout for a run.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunPolicy {
    /// Keep going after a failed job instead of halting.
    pub continue_on_failure: bool,

    /// Maximum wall-clock time for a single job.
    pub timeout_per_job: Duration,
}

impl Default for RunPolicy {
    fn default() -> Self {
        Self {
            continue_on_failure: true,
            timeout_per_job: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Lifecycle of a run session.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Pending,
    Running,
    /// Stopped after a failure with `continue_on_failure` disabled.
    Halted,
    Completed,
}

/// State of one runner invocation.
///
/// Owned by the runner; results are appended in execution order.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RunSession {
    pub run_id: RunId,
    pub jobs: Vec<JobItem>,
    pub results: Vec<JobResult>,
    pub policy: RunPolicy,
    pub status: SessionStatus,
}

/// Status of one job in the summary listing.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Succeeded,
    Failed,
    /// Never attempted because the run halted earlier.
    Skipped,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Succeeded => "SUCCESS",
            Self::Failed => "FAILED",
            Self::Skipped => "SKIPPED",
        };
        f.write_str(label)
    }
}

/// Summary line for one job, in resolved order.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryEntry<'a> {
    pub item: &'a JobItem,
    pub status: JobStatus,
    pub result: Option<&'a JobResult>,
}

/// Aggregated outcome of a run.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub run_id: RunId,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,

    /// Results in execution order.
    pub results: Vec<JobResult>,

    /// Jobs that were never attempted, in resolved order.
    pub skipped_jobs: Vec<JobItem>,

    /// Wall-clock duration of the whole run.
    pub duration: Duration,
}

impl RunSummary {
    /// Build the summary from a finished session.
    pub fn from_session(session: RunSession, duration: Duration) -> Self {
        let total = session.jobs.len();
        let succeeded = session.results.iter().filter(|r| r.is_success()).count();
        let failed = session.results.len() - succeeded;
        let skipped_jobs: Vec<JobItem> = session
            .jobs
            .into_iter()
            .skip(session.results.len())
            .collect();

        Self {
            run_id: session.run_id,
            total,
            succeeded,
            failed,
            skipped: skipped_jobs.len(),
            results: session.results,
            skipped_jobs,
            duration,
        }
    }

    /// True when every job ran and succeeded.
    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.skipped == 0
    }

    /// Process exit code for this run.
    ///
    /// A halted run is never reported as success, even though its skipped
    /// jobs are not counted as failures.
    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            EXIT_SUCCESS
        } else {
            EXIT_FAILURE
        }
    }

    /// Every job with its status, attempted jobs first, then skipped ones.
    pub fn entries(&self) -> Vec<SummaryEntry<'_>> {
        let attempted = self.results.iter().map(|result| SummaryEntry {
            item: &result.item,
            status: match result.outcome {
                JobOutcome::Succeeded => JobStatus::Succeeded,
                JobOutcome::Failed => JobStatus::Failed,
            },
            result: Some(result),
        });
        let skipped = self.skipped_jobs.iter().map(|item| SummaryEntry {
            item,
            status: JobStatus::Skipped,
            result: None,
        });
        attempted.chain(skipped).collect()
    }

    pub fn failed_results(&self) -> impl Iterator<Item = &JobResult> {
        self.results.iter().filter(|r| !r.is_success())
    }
}
