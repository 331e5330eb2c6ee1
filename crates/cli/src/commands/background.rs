//! `start`, `stop` and `status`: the detached run.
//!
//! `start` re-invokes this binary with `run`/`run-all` and a hidden
//! `--release-pidfile` so the detached process can clear its own record.

use super::{load, precondition, run};
use crate::cli::{Cli, RunOpts};
use bb_core::supervisor::{BackgroundStatus, Invocation, Supervisor, SupervisorError};
use bb_protocol::run_models::{EXIT_FAILURE, EXIT_SUCCESS};
use color_eyre::Result;
use colored::Colorize;
use std::path::{Path, PathBuf};

pub async fn start(cli: &Cli, paths: &[PathBuf], opts: &RunOpts) -> Result<i32> {
    // Check everything in the foreground so mistakes are reported here and
    // not only in the background log.
    let prepared = match run::prepare(cli, paths, opts).await {
        Ok(prepared) => prepared,
        Err(code) => return Ok(code),
    };

    let cwd = std::env::current_dir()?;
    let background = &prepared.config.global.background;
    let pidfile = cwd.join(&background.pid_file);
    let log_file = cwd.join(&background.log_file);

    let invocation = Invocation {
        program: std::env::current_exe()?,
        args: child_args(cli, paths, opts, &pidfile),
        log_file: log_file.clone(),
        current_dir: Some(cwd),
    };

    match Supervisor::new(&pidfile).start(&invocation) {
        Ok(handle) => {
            println!(
                "{} background run (pid {}, {} job(s))",
                "Started".green().bold(),
                handle.pid(),
                prepared.jobs.len()
            );
            println!("  log:  {}", log_file.display());
            println!("  stop: batchbook stop");
            Ok(EXIT_SUCCESS)
        }
        Err(e @ SupervisorError::AlreadyRunning { .. }) => Ok(precondition(e)),
        Err(e) => Err(e.into()),
    }
}

/// Arguments for the detached process.
fn child_args(cli: &Cli, paths: &[PathBuf], opts: &RunOpts, pidfile: &Path) -> Vec<String> {
    let mut args = vec![
        "--config-dir".to_string(),
        cli.config_dir.display().to_string(),
    ];
    if cli.verbose {
        args.push("--verbose".to_string());
    } else if cli.quiet {
        args.push("--quiet".to_string());
    }

    let subcommand = if paths.is_empty() { "run-all" } else { "run" };
    args.push(subcommand.to_string());
    args.extend(opts.to_args());
    args.push("--release-pidfile".to_string());
    args.push(pidfile.display().to_string());

    if !paths.is_empty() {
        args.push("--".to_string());
        args.extend(paths.iter().map(|path| path.display().to_string()));
    }
    args
}

pub async fn stop(cli: &Cli) -> Result<i32> {
    let config = match load(cli).await {
        Ok(config) => config,
        Err(code) => return Ok(code),
    };

    match Supervisor::new(&config.global.background.pid_file).stop() {
        Ok(pid) => {
            println!("Sent SIGTERM to background run (pid {pid})");
            Ok(EXIT_SUCCESS)
        }
        Err(SupervisorError::NotRunning { .. }) => {
            println!("No background run is active");
            Ok(EXIT_SUCCESS)
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn status(cli: &Cli, lines: usize) -> Result<i32> {
    let config = match load(cli).await {
        Ok(config) => config,
        Err(code) => return Ok(code),
    };
    let background = &config.global.background;

    let code = match Supervisor::new(&background.pid_file).status()? {
        BackgroundStatus::Running { pid } => {
            println!("{} (pid {pid})", "Background run active".green().bold());
            EXIT_SUCCESS
        }
        BackgroundStatus::Stale { pid } => {
            println!(
                "{} (stale pid-file for pid {pid})",
                "No background run".yellow()
            );
            EXIT_FAILURE
        }
        BackgroundStatus::NotRunning => {
            println!("No background run");
            EXIT_FAILURE
        }
    };

    if lines > 0 {
        if let Some(tail) = tail(&background.log_file, lines) {
            println!("Last lines of {}:", background.log_file.display());
            for line in tail {
                println!("  {line}");
            }
        }
    }

    Ok(code)
}

fn tail(path: &Path, lines: usize) -> Option<Vec<String>> {
    let content = std::fs::read_to_string(path).ok()?;
    let skip = content.lines().count().saturating_sub(lines);
    Some(content.lines().skip(skip).map(str::to_owned).collect())
}
