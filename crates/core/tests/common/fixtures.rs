//! Test fixtures: a temporary project whose jobs are shell scripts.
//!
//! The engine is a [`CommandEngine`] running `sh <input> <output>`, so each
//! job decides its own behavior (exit code, output, sleeping).

use bb_core::engines::CommandEngine;
use bb_core::resolver::{JobListResolver, OutputLayout};
use bb_core::runner::{BatchRunner, RunnerOptions};
use bb_protocol::config_models::CommandTemplate;
use bb_protocol::ipc::Event;
use bb_protocol::job_models::{JobItem, JobSpec, RunId};
use bb_protocol::run_models::{RunPolicy, RunSummary};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;

pub const SUCCEED: &str = "echo \"running $0\"; echo done > \"$1\"";
pub const FAIL: &str = "echo \"something broke\" >&2; exit 3";
pub const HANG: &str = "sleep 30 & wait";

#[allow(dead_code)]
pub struct TestProject {
    pub dir: TempDir,
}

#[allow(dead_code)]
impl TestProject {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("Failed to create temp dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Write `jobs/<name>.sh` and return its path.
    pub fn job(&self, name: &str, script: &str) -> PathBuf {
        let jobs = self.root().join("jobs");
        std::fs::create_dir_all(&jobs).expect("Failed to create jobs dir");
        let path = jobs.join(format!("{name}.sh"));
        std::fs::write(&path, script).expect("Failed to write job");
        path
    }

    pub fn layout(&self) -> OutputLayout {
        OutputLayout::new(self.root().join("outputs"), self.root().join("logs"))
    }

    pub fn resolver(&self, builtin: Vec<JobSpec>) -> JobListResolver {
        JobListResolver::new(builtin, self.layout()).with_extension("sh")
    }

    /// Resolve `jobs` (as `(name, script)` pairs) in the given order.
    pub fn items(&self, jobs: &[(&str, &str)], run_id: &RunId) -> Vec<JobItem> {
        let paths: Vec<PathBuf> = jobs
            .iter()
            .map(|(name, script)| self.job(name, script))
            .collect();
        self.resolver(Vec::new())
            .resolve(&paths, run_id)
            .expect("Failed to resolve jobs")
    }
}

#[allow(dead_code)]
pub fn script_engine() -> CommandEngine {
    CommandEngine::new(CommandTemplate {
        program: "sh".to_string(),
        args: vec!["{input}".to_string(), "{output}".to_string()],
    })
}

#[allow(dead_code)]
pub fn policy(continue_on_failure: bool, timeout: Duration) -> RunPolicy {
    RunPolicy {
        continue_on_failure,
        timeout_per_job: timeout,
    }
}

/// Run `jobs` with the script engine and collect every emitted event.
#[allow(dead_code)]
pub async fn run_collecting(
    jobs: Vec<JobItem>,
    policy: RunPolicy,
    forward_output: bool,
) -> (RunSummary, Vec<Event>) {
    let runner = BatchRunner::new(
        Arc::new(script_engine()),
        RunnerOptions {
            forward_output,
            ..RunnerOptions::default()
        },
    );
    let (tx, mut rx) = mpsc::channel(1024);

    let summary = runner.run(RunId::new("20240101_120000"), jobs, policy, tx).await;

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    (summary, events)
}
