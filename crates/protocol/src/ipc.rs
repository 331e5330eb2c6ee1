//! Progress events emitted by the runner.
//!
//! The runner never prints. It reports what happens through a channel of
//! [`Event`]s and the front end (the CLI) decides how to render them. The
//! events are serializable so a background run could forward them too.
//!
//! ```json
//! {
//!   "type": "jobStarted",
//!   "payload": { "index": 0, "total": 5, "source": "notebooks/regression.ipynb" }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::job_models::RunId;
use crate::run_models::{JobResult, RunSummary};

/// Events sent from the runner to the front end.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Event {
    /// A run has started with the given number of jobs.
    RunStarted { run_id: RunId, total: usize },

    /// A job is about to be executed.
    JobStarted {
        index: usize,
        total: usize,
        source: PathBuf,
        log: PathBuf,
    },

    /// A line of engine output (only sent in verbose mode).
    JobOutput { index: usize, line: String },

    /// A job has finished, successfully or not.
    JobFinished { index: usize, result: JobResult },

    /// The run stopped early; the remaining jobs will not be attempted.
    RunHalted { remaining: usize },

    /// The run is over.
    RunFinished { summary: RunSummary },
}
