//! Terminal rendering of run progress and summaries.
//!
//! Everything here writes to stdout; diagnostics go through `tracing` to
//! stderr instead.

use bb_core::datasets::{DownloadProgress, DownloadSummary};
use bb_protocol::config_models::Verbosity;
use bb_protocol::ipc::Event;
use bb_protocol::run_models::{JobResult, JobStatus, RunSummary};
use colored::Colorize;
use std::time::Duration;
use tokio::sync::mpsc::Receiver;

/// How progress events are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Text(Verbosity),
    Json,
}

/// Print events until the runner drops its sender.
pub async fn render_events(mut rx: Receiver<Event>, style: Style) {
    while let Some(event) = rx.recv().await {
        match style {
            Style::Json => match serde_json::to_string(&event) {
                Ok(line) => println!("{line}"),
                Err(e) => tracing::warn!(error = %e, "failed to serialize event"),
            },
            Style::Text(verbosity) => render_event(&event, verbosity),
        }
    }
}

fn render_event(event: &Event, verbosity: Verbosity) {
    let progress = verbosity != Verbosity::Quiet;
    match event {
        Event::RunStarted { run_id, total } if progress => {
            println!("{} {run_id} ({total} job(s))", "Run".bold());
        }
        Event::JobStarted {
            index,
            total,
            source,
            log,
        } if progress => {
            println!(
                "[{}/{total}] {} {}",
                index + 1,
                "Running".cyan(),
                source.display()
            );
            println!("        log: {}", log.display().to_string().dimmed());
        }
        Event::JobOutput { line, .. } if verbosity == Verbosity::Verbose => {
            println!("        {}", line.dimmed());
        }
        Event::JobFinished { index, result } if progress => {
            println!("[{}] {}", index + 1, job_line(result));
        }
        Event::RunHalted { remaining } if progress => {
            println!(
                "{}",
                format!("Halting after failure: {remaining} job(s) will not run").yellow()
            );
        }
        Event::RunFinished { summary } => print_summary(summary),
        _ => {}
    }
}

fn job_line(result: &JobResult) -> String {
    let duration = format_duration(result.duration());
    match &result.reason {
        None => format!("{} {} ({duration})", "SUCCESS".green(), result.item.name()),
        Some(reason) => format!(
            "{} {} ({duration}): {reason}",
            "FAILED".red(),
            result.item.name()
        ),
    }
}

fn status_label(status: JobStatus) -> String {
    let label = format!("{:<8}", status.to_string());
    match status {
        JobStatus::Succeeded => label.green().to_string(),
        JobStatus::Failed => label.red().to_string(),
        JobStatus::Skipped => label.yellow().to_string(),
    }
}

/// Print the final per-job listing, counts and failed logs.
pub fn print_summary(summary: &RunSummary) {
    println!();
    println!("{} {}", "Summary for run".bold(), summary.run_id);

    for entry in summary.entries() {
        let detail = match entry.result {
            Some(result) => {
                let duration = format_duration(result.duration());
                match &result.reason {
                    Some(reason) => format!("{duration}  {reason}"),
                    None => duration,
                }
            }
            None => String::new(),
        };
        println!(
            "  {} {:<32} {}",
            status_label(entry.status),
            entry.item.name(),
            detail
        );
    }

    println!(
        "Total: {}  succeeded: {}  failed: {}  skipped: {}  time: {}",
        summary.total,
        summary.succeeded.to_string().green(),
        summary.failed.to_string().red(),
        summary.skipped.to_string().yellow(),
        format_duration(summary.duration)
    );

    let failed: Vec<_> = summary.failed_results().collect();
    if !failed.is_empty() {
        println!("Logs of failed jobs:");
        for result in failed {
            println!("  {}", result.item.log_path().display());
        }
    }

    if summary.is_success() {
        println!("{}", "All jobs succeeded".green().bold());
    } else {
        println!("{}", "Run did not complete successfully".red().bold());
    }
}

pub fn render_download(progress: &DownloadProgress<'_>, verbosity: Verbosity) {
    if verbosity == Verbosity::Quiet {
        return;
    }
    match progress {
        DownloadProgress::Started {
            index,
            total,
            dataset,
        } => {
            let label = if dataset.description.is_empty() {
                dataset.id.as_str()
            } else {
                dataset.description.as_str()
            };
            println!(
                "[{}/{total}] {} {label} -> {}",
                index + 1,
                "Downloading".cyan(),
                dataset.dest.display()
            );
        }
        DownloadProgress::Finished {
            dataset,
            result: Ok(()),
        } => println!("        {} {}", "done".green(), dataset.id),
        DownloadProgress::Finished {
            dataset,
            result: Err(e),
        } => println!("        {} {}: {e}", "failed".red(), dataset.id),
    }
}

pub fn print_download_summary(summary: &DownloadSummary) {
    println!(
        "Datasets: {}  downloaded: {}  failed: {}",
        summary.total(),
        summary.succeeded.len().to_string().green(),
        summary.failed.len().to_string().red()
    );
    for (dataset, error) in &summary.failed {
        println!("  {} {}: {error}", "FAILED".red(), dataset.id);
    }
}

/// `850ms`, `12.3s`, `4m 05s`, `1h 02m 09s`.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs == 0 {
        format!("{}ms", duration.as_millis())
    } else if secs < 60 {
        format!("{:.1}s", duration.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {:02}s", secs / 60, secs % 60)
    } else {
        format!("{}h {:02}m {:02}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
