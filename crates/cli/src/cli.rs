use bb_protocol::config_models::{EngineKind, GlobalConfig, Verbosity};
use clap::{ArgAction, Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "batchbook", version, about = "Run notebook jobs one after another")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration directory holding config.toml and jobs.yaml.
    #[arg(long, global = true, value_name = "DIR", default_value = ".batchbook")]
    pub config_dir: PathBuf,

    /// Echo engine output and enable debug logging.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only print the final summary.
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

impl Cli {
    /// Verbosity from the flags, falling back to the configured value.
    pub fn verbosity(&self, configured: Verbosity) -> Verbosity {
        if self.verbose {
            Verbosity::Verbose
        } else if self.quiet {
            Verbosity::Quiet
        } else {
            configured
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the given jobs (files or directories) in the foreground.
    Run {
        #[arg(required = true, value_name = "PATHS")]
        paths: Vec<PathBuf>,

        #[command(flatten)]
        opts: RunOpts,
    },

    /// Run the built-in job list in the foreground.
    RunAll {
        #[command(flatten)]
        opts: RunOpts,
    },

    /// Start a detached run of the given jobs, or of the built-in list.
    Start {
        #[arg(value_name = "PATHS")]
        paths: Vec<PathBuf>,

        #[command(flatten)]
        opts: RunOpts,
    },

    /// Ask the background run to terminate.
    Stop,

    /// Report whether a background run is active.
    Status {
        /// Trailing lines of the background log to show.
        #[arg(long, default_value_t = 10)]
        lines: usize,
    },

    /// Download the configured datasets with the kaggle CLI.
    Download,

    /// Create a .batchbook/ directory with default settings.
    Init {
        /// Project root to initialize.
        #[arg(default_value = ".")]
        dir: PathBuf,

        /// Overwrite an existing .batchbook/ directory.
        #[arg(long)]
        force: bool,

        /// Only write config.toml.
        #[arg(long)]
        minimal: bool,
    },
}

/// Options shared by every command that runs jobs.
#[derive(ClapArgs, Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOpts {
    /// Keep going after a failed job.
    #[arg(long, value_name = "BOOL", action = ArgAction::Set, conflicts_with = "fail_fast")]
    pub continue_on_failure: Option<bool>,

    /// Stop at the first failed job.
    #[arg(long)]
    pub fail_fast: bool,

    /// Per-job timeout in seconds.
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Kernel handed to the engine.
    #[arg(long)]
    pub kernel: Option<String>,

    /// papermill, nbconvert or command.
    #[arg(long, value_name = "KIND")]
    pub engine: Option<EngineKind>,

    /// Keep executing cells after an error (nbconvert).
    #[arg(long)]
    pub allow_errors: bool,

    /// Print progress events as JSON lines instead of text.
    #[arg(long)]
    pub json: bool,

    /// Pid-file to release when the run ends; set for detached runs.
    #[arg(long, hide = true, value_name = "PATH")]
    pub release_pidfile: Option<PathBuf>,
}

impl RunOpts {
    /// Apply the command-line overrides on top of the file settings.
    pub fn apply(&self, global: &mut GlobalConfig) {
        if let Some(value) = self.continue_on_failure {
            global.continue_on_failure = value;
        }
        if self.fail_fast {
            global.continue_on_failure = false;
        }
        if let Some(secs) = self.timeout {
            global.timeout_secs = secs;
        }
        if let Some(kernel) = &self.kernel {
            global.kernel.clone_from(kernel);
        }
        if let Some(engine) = self.engine {
            global.engine = engine;
        }
        if self.allow_errors {
            global.allow_errors = true;
        }
    }

    /// The same options as command-line arguments, for re-invoking the binary.
    ///
    /// `release_pidfile` is not included.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(value) = self.continue_on_failure {
            args.push(format!("--continue-on-failure={value}"));
        }
        if self.fail_fast {
            args.push("--fail-fast".to_string());
        }
        if let Some(secs) = self.timeout {
            args.push(format!("--timeout={secs}"));
        }
        if let Some(kernel) = &self.kernel {
            args.push(format!("--kernel={kernel}"));
        }
        if let Some(engine) = self.engine {
            args.push(format!("--engine={engine}"));
        }
        if self.allow_errors {
            args.push("--allow-errors".to_string());
        }
        if self.json {
            args.push("--json".to_string());
        }
        args
    }
}
