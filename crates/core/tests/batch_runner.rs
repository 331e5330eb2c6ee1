//! Integration tests for BatchRunner.
//!
//! These tests verify that the runner:
//! - Executes jobs strictly one at a time, in resolved order
//! - Classifies every attempt and never aborts on a job failure
//! - Halts after a failure only when continue_on_failure is disabled
//! - Kills jobs that exceed the per-job timeout
//! - Captures engine output into one log per job

mod common;

use bb_core::engines::CommandEngine;
use bb_core::runner::{BatchRunner, RunnerOptions};
use bb_protocol::config_models::CommandTemplate;
use bb_protocol::job_models::RunId;
use bb_protocol::run_models::{FailureReason, JobOutcome, EXIT_FAILURE, EXIT_SUCCESS};
use common::*;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

fn run_id() -> RunId {
    RunId::new("20240101_120000")
}

/// Three jobs, the second fails, run continues.
#[tokio::test]
async fn test_failure_with_continue_runs_every_job() {
    let project = TestProject::new();
    let jobs = project.items(&[("a", SUCCEED), ("b", FAIL), ("c", SUCCEED)], &run_id());

    let (summary, events) =
        run_collecting(jobs.clone(), policy(true, Duration::from_secs(30)), false).await;

    assert_event_sequence(&events);
    assert_eq!(summary.total, 3);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.skipped, 0);
    assert_eq!(summary.exit_code(), EXIT_FAILURE);

    assert_eq!(
        summary.results[1].reason,
        Some(FailureReason::ExecutionFailure { exit_code: Some(3) })
    );
    assert_eq!(summary.results[1].exit_code, Some(3));

    // Every attempted job gets its own log; successful ones their output.
    for item in &jobs {
        assert!(item.log.exists(), "missing log {}", item.log.display());
    }
    assert!(jobs[0].output.exists());
    assert!(jobs[2].output.exists());
    assert!(halted_remaining(&events).is_none());
}

/// Three jobs, the second fails, run halts.
#[tokio::test]
async fn test_failure_without_continue_halts() {
    let project = TestProject::new();
    let jobs = project.items(&[("a", SUCCEED), ("b", FAIL), ("c", SUCCEED)], &run_id());

    let (summary, events) =
        run_collecting(jobs.clone(), policy(false, Duration::from_secs(30)), false).await;

    assert_event_sequence(&events);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.skipped_jobs[0].source, jobs[2].source);
    assert_eq!(summary.exit_code(), EXIT_FAILURE);

    assert_eq!(count_job_started(&events), 2);
    assert_eq!(halted_remaining(&events), Some(1));

    // The skipped job was never touched.
    assert!(!jobs[2].log.exists());
    assert!(!jobs[2].output.exists());
}

/// A hanging job is killed at the timeout and the run moves on.
#[tokio::test]
async fn test_timeout_kills_job_and_continues() {
    let project = TestProject::new();
    let jobs = project.items(&[("hang", HANG), ("after", SUCCEED)], &run_id());
    let started = Instant::now();

    let (summary, _events) =
        run_collecting(jobs.clone(), policy(true, Duration::from_secs(1)), false).await;

    assert!(
        started.elapsed() < Duration::from_secs(15),
        "timeout was not enforced"
    );
    assert_eq!(
        summary.results[0].reason,
        Some(FailureReason::Timeout { after_secs: 1 })
    );
    assert_eq!(summary.results[1].outcome, JobOutcome::Succeeded);

    let log = std::fs::read_to_string(&jobs[0].log).expect("log should exist");
    assert!(log.contains("Timeout"));
}

#[tokio::test]
async fn test_all_succeed() {
    let project = TestProject::new();
    let jobs = project.items(&[("a", SUCCEED), ("b", SUCCEED)], &run_id());

    let (summary, events) =
        run_collecting(jobs, policy(true, Duration::from_secs(30)), false).await;

    assert_event_sequence(&events);
    assert!(summary.is_success());
    assert_eq!(summary.exit_code(), EXIT_SUCCESS);
}

/// For every list length and failure position, the attempted jobs are a
/// prefix of the resolved list and everything else is skipped.
#[tokio::test]
async fn test_halt_attempts_exact_prefix() {
    for total in 1..=4 {
        for failing in 0..total {
            let project = TestProject::new();
            let specs: Vec<(String, &str)> = (0..total)
                .map(|i| {
                    let script = if i == failing { FAIL } else { SUCCEED };
                    (format!("job{i}"), script)
                })
                .collect();
            let pairs: Vec<(&str, &str)> =
                specs.iter().map(|(n, s)| (n.as_str(), *s)).collect();
            let jobs = project.items(&pairs, &run_id());

            let (summary, _events) =
                run_collecting(jobs.clone(), policy(false, Duration::from_secs(30)), false)
                    .await;

            assert_eq!(summary.results.len(), failing + 1, "total={total} failing={failing}");
            assert_eq!(summary.results.len() + summary.skipped, total);
            for (result, item) in summary.results.iter().zip(&jobs) {
                assert_eq!(result.item.source, item.source);
            }
        }
    }
}

/// With continue enabled, every job is attempted regardless of failures.
#[tokio::test]
async fn test_continue_attempts_every_job() {
    for total in 1..=4 {
        let project = TestProject::new();
        let names: Vec<String> = (0..total).map(|i| format!("job{i}")).collect();
        let pairs: Vec<(&str, &str)> = names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.as_str(), if i % 2 == 0 { FAIL } else { SUCCEED }))
            .collect();
        let jobs = project.items(&pairs, &run_id());

        let (summary, _events) =
            run_collecting(jobs, policy(true, Duration::from_secs(30)), false).await;

        assert_eq!(summary.results.len(), total);
        assert_eq!(summary.skipped, 0);
    }
}

/// A timed out job takes its background children down with it.
#[tokio::test]
async fn test_timeout_kills_whole_job() {
    let project = TestProject::new();
    let marker = project.root().join("late-write");
    let script = format!("(sleep 2; touch '{}') & wait", marker.display());
    let jobs = project.items(&[("forks", script.as_str()), ("after", SUCCEED)], &run_id());

    let (summary, _events) =
        run_collecting(jobs, policy(true, Duration::from_secs(1)), false).await;

    assert_eq!(
        summary.results[0].reason,
        Some(FailureReason::Timeout { after_secs: 1 })
    );
    assert_eq!(summary.results[1].outcome, JobOutcome::Succeeded);
    tokio::time::sleep(Duration::from_millis(2000)).await;
    assert!(!marker.exists(), "the timed out job kept running");
}

/// An engine that exits while a child still holds its output is judged by
/// its exit status.
#[tokio::test]
async fn test_exit_status_wins_over_lingering_children() {
    let project = TestProject::new();
    let jobs = project.items(&[("detaches", "sleep 30 & exit 0")], &run_id());
    let started = Instant::now();

    let (summary, _events) =
        run_collecting(jobs, policy(true, Duration::from_secs(10)), false).await;

    assert_eq!(summary.results[0].outcome, JobOutcome::Succeeded);
    assert!(started.elapsed() < Duration::from_secs(10));
}

/// No two jobs overlap in time.
#[tokio::test]
async fn test_jobs_never_overlap() {
    let project = TestProject::new();
    let jobs = project.items(
        &[
            ("a", "sleep 0.2"),
            ("b", "sleep 0.2"),
            ("c", "sleep 0.2"),
        ],
        &run_id(),
    );

    let (summary, _events) =
        run_collecting(jobs, policy(true, Duration::from_secs(30)), false).await;

    for pair in summary.results.windows(2) {
        assert!(
            pair[1].started_at >= pair[0].finished_at,
            "{} started before {} finished",
            pair[1].item.name(),
            pair[0].item.name()
        );
    }
}

#[tokio::test]
async fn test_missing_input_is_a_failed_job() {
    let project = TestProject::new();
    let jobs = project.items(&[("a", SUCCEED), ("b", SUCCEED)], &run_id());
    std::fs::remove_file(&jobs[0].source).expect("Failed to remove job");

    let (summary, _events) =
        run_collecting(jobs, policy(true, Duration::from_secs(30)), false).await;

    assert_eq!(summary.results[0].reason, Some(FailureReason::InputNotFound));
    assert_eq!(summary.results[1].outcome, JobOutcome::Succeeded);
}

#[tokio::test]
async fn test_logs_hold_only_their_own_output() {
    let project = TestProject::new();
    let jobs = project.items(
        &[("first", "echo output-of-first"), ("second", "echo output-of-second >&2")],
        &run_id(),
    );

    run_collecting(jobs.clone(), policy(true, Duration::from_secs(30)), false).await;

    let first = std::fs::read_to_string(&jobs[0].log).expect("first log");
    let second = std::fs::read_to_string(&jobs[1].log).expect("second log");
    assert!(first.contains("output-of-first"));
    assert!(!first.contains("output-of-second"));
    assert!(second.contains("output-of-second"));
}

#[tokio::test]
async fn test_verbose_forwards_output_lines() {
    let project = TestProject::new();
    let jobs = project.items(&[("talk", "echo line-1; echo line-2")], &run_id());

    let (_summary, events) =
        run_collecting(jobs, policy(true, Duration::from_secs(30)), true).await;

    assert_event_sequence(&events);
    assert_eq!(output_lines(&events, 0), vec!["line-1", "line-2"]);
}

#[tokio::test]
async fn test_quiet_sends_no_output_lines() {
    let project = TestProject::new();
    let jobs = project.items(&[("talk", "echo line-1")], &run_id());

    let (_summary, events) =
        run_collecting(jobs, policy(true, Duration::from_secs(30)), false).await;

    assert!(output_lines(&events, 0).is_empty());
}

#[tokio::test]
async fn test_unstartable_engine_fails_each_job() {
    let project = TestProject::new();
    let jobs = project.items(&[("a", SUCCEED), ("b", SUCCEED)], &run_id());
    let engine = CommandEngine::new(CommandTemplate {
        program: "/nonexistent/engine".to_string(),
        args: vec!["{input}".to_string()],
    });
    let runner = BatchRunner::new(Arc::new(engine), RunnerOptions::default());
    let (tx, _rx) = mpsc::channel(1024);

    let summary = runner
        .run(run_id(), jobs, policy(true, Duration::from_secs(5)), tx)
        .await;

    assert_eq!(summary.failed, 2);
    assert!(summary
        .results
        .iter()
        .all(|r| matches!(r.reason, Some(FailureReason::Spawn { .. }))));
}

#[tokio::test]
async fn test_parameters_reach_the_engine() {
    use bb_protocol::job_models::{JobSpec, ParamValue};

    let project = TestProject::new();
    let path = project.job("params", "echo \"args: $*\"");
    let mut spec = JobSpec::new(&path);
    spec.parameters.insert("seed".into(), ParamValue::Int(42));
    let jobs = project
        .resolver(vec![spec])
        .resolve::<&str>(&[], &run_id())
        .expect("should resolve");

    run_collecting(jobs.clone(), policy(true, Duration::from_secs(30)), false).await;

    let log = std::fs::read_to_string(&jobs[0].log).expect("log");
    assert!(log.contains("--seed=42"));
}
