//! `run` and `run-all`: resolve the job list and execute it in the foreground.

use super::{load, precondition, EXIT_INTERRUPTED, EXIT_TERMINATED};
use crate::cli::{Cli, RunOpts};
use crate::render::{self, Style};
use bb_core::config::models::AppConfig;
use bb_core::engines::{Engine, EngineFactory};
use bb_core::resolver::JobListResolver;
use bb_core::runner::{BatchRunner, RunnerOptions};
use bb_core::supervisor::Supervisor;
use bb_protocol::config_models::Verbosity;
use bb_protocol::job_models::{JobItem, RunId};
use bb_protocol::run_models::RunPolicy;
use color_eyre::Result;
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// A run whose preconditions all hold.
pub struct PreparedRun {
    pub config: AppConfig,
    pub run_id: RunId,
    pub engine: Arc<dyn Engine>,
    pub jobs: Vec<JobItem>,
    pub policy: RunPolicy,
    pub options: RunnerOptions,
    pub style: Style,
}

/// Load settings, check the engine and resolve the jobs.
///
/// On failure the message is already printed and the error is the exit code.
pub async fn prepare(cli: &Cli, paths: &[PathBuf], opts: &RunOpts) -> Result<PreparedRun, i32> {
    let mut config = load(cli).await?;
    opts.apply(&mut config.global);

    let engine = EngineFactory::create(&config.global).map_err(precondition)?;
    let program = engine.check_availability().map_err(precondition)?;
    debug!(engine = engine.name(), program = %program.display(), "engine available");

    let run_id = RunId::now();
    let jobs = JobListResolver::new(config.jobs.clone(), config.layout())
        .with_default_parameters(config.global.parameters.clone())
        .with_extension(config.global.job_extension.clone())
        .resolve(paths, &run_id)
        .map_err(precondition)?;

    let verbosity = cli.verbosity(config.global.verbosity);
    let style = if opts.json {
        Style::Json
    } else {
        Style::Text(verbosity)
    };
    let options = RunnerOptions {
        kernel: config.global.kernel.clone(),
        allow_errors: config.global.allow_errors,
        working_dir: config.global.working_dir.clone(),
        forward_output: verbosity == Verbosity::Verbose,
    };

    Ok(PreparedRun {
        policy: config.policy(),
        config,
        run_id,
        engine,
        jobs,
        options,
        style,
    })
}

pub async fn execute(cli: &Cli, paths: &[PathBuf], opts: &RunOpts) -> Result<i32> {
    let mut shutdown = Shutdown::install();
    let code = match prepare(cli, paths, opts).await {
        Ok(prepared) => run_foreground(prepared, &mut shutdown).await,
        Err(code) => code,
    };

    // A detached run removes its own pid-file however it ends.
    if let Some(pidfile) = &opts.release_pidfile {
        release(pidfile);
    }

    Ok(code)
}

async fn run_foreground(prepared: PreparedRun, shutdown: &mut Shutdown) -> i32 {
    let PreparedRun {
        run_id,
        engine,
        jobs,
        policy,
        options,
        style,
        ..
    } = prepared;

    let (events_tx, events_rx) = mpsc::channel(256);
    let renderer = tokio::spawn(render::render_events(events_rx, style));
    let runner = BatchRunner::new(engine, options);

    // Dropping the run future kills the current engine process.
    let code = tokio::select! {
        summary = runner.run(run_id, jobs, policy, events_tx) => summary.exit_code(),
        code = shutdown.recv() => {
            eprintln!(
                "{} run interrupted, the current job was terminated",
                "warning:".yellow().bold()
            );
            code
        }
    };

    if let Err(e) = renderer.await {
        warn!(error = %e, "progress renderer stopped unexpectedly");
    }
    code
}

/// Ctrl-C and SIGTERM listener.
///
/// The SIGTERM handler is registered on creation, so a `stop` that arrives
/// before the first job starts is still handled.
struct Shutdown {
    #[cfg(unix)]
    terminate: Option<tokio::signal::unix::Signal>,
}

impl Shutdown {
    #[cfg(unix)]
    fn install() -> Self {
        use tokio::signal::unix::{signal, SignalKind};

        let terminate = match signal(SignalKind::terminate()) {
            Ok(terminate) => Some(terminate),
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                None
            }
        };
        Self { terminate }
    }

    #[cfg(not(unix))]
    fn install() -> Self {
        Self {}
    }

    /// Resolves with the exit code matching the signal received.
    #[cfg(unix)]
    async fn recv(&mut self) -> i32 {
        match self.terminate.as_mut() {
            Some(terminate) => tokio::select! {
                _ = ctrl_c() => EXIT_INTERRUPTED,
                _ = terminate.recv() => EXIT_TERMINATED,
            },
            None => {
                ctrl_c().await;
                EXIT_INTERRUPTED
            }
        }
    }

    #[cfg(not(unix))]
    async fn recv(&mut self) -> i32 {
        ctrl_c().await;
        EXIT_INTERRUPTED
    }
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

fn release(pidfile: &Path) {
    match Supervisor::new(pidfile).release(std::process::id()) {
        Ok(true) => debug!(pidfile = %pidfile.display(), "pid-file released"),
        Ok(false) => warn!(
            pidfile = %pidfile.display(),
            "pid-file no longer records this process"
        ),
        Err(e) => warn!(error = %e, "failed to release pid-file"),
    }
}
