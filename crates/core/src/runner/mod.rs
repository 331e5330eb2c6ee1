//! Sequential batch runner.
//!
//! The BatchRunner executes resolved jobs one at a time in order, captures
//! engine output into per-job logs, classifies every attempt, and applies the
//! run policy (continue or halt) after a failure.

use crate::engines::base::{Engine, ExecutionContext};
use crate::engines::process::{OutputForward, ProcessExecutor, ProcessExit};
use crate::state::session::{
    announce_job, create_session, finish_session, halt_session, record_result, start_session,
};
use bb_protocol::ipc::Event;
use bb_protocol::job_models::{JobItem, RunId};
use bb_protocol::run_models::{FailureReason, JobOutcome, JobResult, RunPolicy, RunSummary};
use chrono::Local;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc::Sender;
use tracing::{info, warn};

/// Engine settings that stay the same for every job of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerOptions {
    pub kernel: String,
    pub allow_errors: bool,
    pub working_dir: Option<PathBuf>,

    /// Send every engine output line as [`Event::JobOutput`].
    pub forward_output: bool,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            kernel: "python3".to_string(),
            allow_errors: false,
            working_dir: None,
            forward_output: false,
        }
    }
}

/// The sequential batch runner.
pub struct BatchRunner {
    engine: Arc<dyn Engine>,
    options: RunnerOptions,
}

impl BatchRunner {
    pub fn new(engine: Arc<dyn Engine>, options: RunnerOptions) -> Self {
        Self { engine, options }
    }

    /// Execute `jobs` in order and return the run summary.
    ///
    /// 1. Emits RunStarted
    /// 2. For each job: emits JobStarted, executes it, emits JobFinished
    /// 3. After a failure with `continue_on_failure` disabled, emits
    ///    RunHalted and attempts nothing further
    /// 4. Emits RunFinished with the summary
    ///
    /// Job failures never surface as errors; they are recorded in the
    /// summary. At most one engine process group is alive at any time; a job's
    /// group is killed before the next job starts.
    pub async fn run(
        &self,
        run_id: RunId,
        jobs: Vec<JobItem>,
        policy: RunPolicy,
        events_tx: Sender<Event>,
    ) -> RunSummary {
        let started = Instant::now();
        let mut session = create_session(run_id, jobs, policy);

        info!(
            run_id = %session.run_id,
            jobs = session.jobs.len(),
            engine = self.engine.name(),
            "starting batch run"
        );
        start_session(&mut session, &events_tx).await;

        let jobs = session.jobs.clone();
        for (index, item) in jobs.iter().enumerate() {
            announce_job(&session, index, &events_tx).await;

            let result = self.execute_job(index, item, &policy, &events_tx).await;
            let succeeded = result.is_success();
            record_result(&mut session, index, result, &events_tx).await;

            if !succeeded && !policy.continue_on_failure {
                warn!(
                    job = %item.name(),
                    remaining = jobs.len() - index - 1,
                    "halting run after failure"
                );
                halt_session(&mut session, &events_tx).await;
                break;
            }
        }

        let summary = finish_session(session, started.elapsed(), &events_tx).await;
        info!(
            run_id = %summary.run_id,
            succeeded = summary.succeeded,
            failed = summary.failed,
            skipped = summary.skipped,
            "batch run finished"
        );
        summary
    }

    /// Execute a single job and classify the attempt.
    async fn execute_job(
        &self,
        index: usize,
        item: &JobItem,
        policy: &RunPolicy,
        events_tx: &Sender<Event>,
    ) -> JobResult {
        let started_at = Local::now();
        let finish = |outcome: JobOutcome, reason: Option<FailureReason>, exit_code: Option<i32>| {
            JobResult {
                item: item.clone(),
                outcome,
                reason,
                started_at,
                finished_at: Local::now(),
                exit_code,
            }
        };

        if !item.source.exists() {
            warn!(job = %item.source.display(), "job input not found; skipping engine");
            return finish(JobOutcome::Failed, Some(FailureReason::InputNotFound), None);
        }

        if let Err(e) = prepare_locations(item).await {
            warn!(job = %item.name(), error = %e, "could not prepare output locations");
            return finish(
                JobOutcome::Failed,
                Some(FailureReason::Setup {
                    message: e.to_string(),
                }),
                None,
            );
        }

        let mut context = ExecutionContext::new(&self.options.kernel, policy.timeout_per_job)
            .with_allow_errors(self.options.allow_errors);
        if let Some(dir) = &self.options.working_dir {
            context = context.with_working_dir(dir);
        }
        let command = self.engine.command(item, &context);
        info!(job = %item.name(), log = %item.log.display(), "executing job");

        let forward = self.options.forward_output.then(|| OutputForward {
            index,
            events_tx: events_tx.clone(),
        });

        match ProcessExecutor::run(&command, &item.log, policy.timeout_per_job, forward).await {
            Ok(ProcessExit::Exited(Some(0))) => finish(JobOutcome::Succeeded, None, Some(0)),
            Ok(ProcessExit::Exited(exit_code)) => finish(
                JobOutcome::Failed,
                Some(FailureReason::ExecutionFailure { exit_code }),
                exit_code,
            ),
            Ok(ProcessExit::TimedOut) => {
                warn!(job = %item.name(), timeout_secs = policy.timeout_per_job.as_secs(), "job timed out");
                finish(
                    JobOutcome::Failed,
                    Some(FailureReason::Timeout {
                        after_secs: policy.timeout_per_job.as_secs(),
                    }),
                    None,
                )
            }
            Ok(ProcessExit::SpawnFailed(message)) => finish(
                JobOutcome::Failed,
                Some(FailureReason::Spawn { message }),
                None,
            ),
            Err(e) => finish(
                JobOutcome::Failed,
                Some(FailureReason::Setup {
                    message: format!("log capture failed: {e}"),
                }),
                None,
            ),
        }
    }
}

/// Create the parent directories of the output and log paths.
async fn prepare_locations(item: &JobItem) -> std::io::Result<()> {
    for path in [&item.output, &item.log] {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            ensure_dir(parent).await?;
        }
    }
    Ok(())
}

async fn ensure_dir(dir: &Path) -> std::io::Result<()> {
    tokio::fs::create_dir_all(dir).await.map_err(|e| {
        std::io::Error::new(e.kind(), format!("cannot create {}: {e}", dir.display()))
    })
}
