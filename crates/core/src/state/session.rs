//! Run session state machine.
//!
//! ```text
//! Pending -> Running -> Completed
//!                    \-> Halted
//! ```

use bb_protocol::ipc::Event;
use bb_protocol::job_models::{JobItem, RunId};
use bb_protocol::run_models::{JobResult, RunPolicy, RunSession, RunSummary, SessionStatus};
use std::time::Duration;
use tokio::sync::mpsc::Sender;

/// Create a new session with Pending status.
pub fn create_session(run_id: RunId, jobs: Vec<JobItem>, policy: RunPolicy) -> RunSession {
    RunSession {
        run_id,
        jobs,
        results: Vec::new(),
        policy,
        status: SessionStatus::Pending,
    }
}

/// Transition the session to Running and announce the run.
pub async fn start_session(session: &mut RunSession, events_tx: &Sender<Event>) {
    session.status = SessionStatus::Running;
    let _ = events_tx
        .send(Event::RunStarted {
            run_id: session.run_id.clone(),
            total: session.jobs.len(),
        })
        .await;
}

/// Announce that the job at `index` is about to run.
pub async fn announce_job(session: &RunSession, index: usize, events_tx: &Sender<Event>) {
    let Some(item) = session.jobs.get(index) else {
        return;
    };
    let _ = events_tx
        .send(Event::JobStarted {
            index,
            total: session.jobs.len(),
            source: item.source.clone(),
            log: item.log.clone(),
        })
        .await;
}

/// Append the result of the job at `index` and emit it.
///
/// Results are only ever appended, so `results[i]` always belongs to
/// `jobs[i]`.
pub async fn record_result(
    session: &mut RunSession,
    index: usize,
    result: JobResult,
    events_tx: &Sender<Event>,
) {
    debug_assert_eq!(index, session.results.len());
    session.results.push(result.clone());
    let _ = events_tx.send(Event::JobFinished { index, result }).await;
}

/// Stop the session after a failure; the remaining jobs are skipped.
pub async fn halt_session(session: &mut RunSession, events_tx: &Sender<Event>) {
    session.status = SessionStatus::Halted;
    let remaining = session.jobs.len().saturating_sub(session.results.len());
    let _ = events_tx.send(Event::RunHalted { remaining }).await;
}

/// Close the session and emit the final summary.
///
/// A running session becomes Completed; a halted one stays Halted.
pub async fn finish_session(
    mut session: RunSession,
    duration: Duration,
    events_tx: &Sender<Event>,
) -> RunSummary {
    if session.status == SessionStatus::Running {
        session.status = SessionStatus::Completed;
    }
    let summary = RunSummary::from_session(session, duration);
    let _ = events_tx
        .send(Event::RunFinished {
            summary: summary.clone(),
        })
        .await;
    summary
}
