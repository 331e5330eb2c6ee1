//! Global configuration models for `.batchbook/config.toml`.
//!
//! This module defines the structure of the global configuration file that
//! controls how runs are executed. Every field has a default, so an empty
//! file (or no file at all) is a valid configuration.

use crate::job_models::Parameters;
use crate::run_models::DEFAULT_TIMEOUT_SECS;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Which external tool executes the jobs.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// `papermill <in> <out> -k <kernel> -p name value ...`
    #[default]
    Papermill,

    /// `jupyter nbconvert --execute`
    Nbconvert,

    /// A user-defined command template (see [`CommandTemplate`]).
    Command,
}

impl FromStr for EngineKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "papermill" => Ok(Self::Papermill),
            "nbconvert" => Ok(Self::Nbconvert),
            "command" => Ok(Self::Command),
            other => Err(format!(
                "unknown engine '{other}' (expected papermill, nbconvert or command)"
            )),
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Papermill => "papermill",
            Self::Nbconvert => "nbconvert",
            Self::Command => "command",
        };
        f.write_str(name)
    }
}

/// How much of the engine output is echoed while a run progresses.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    /// Only the final summary.
    Quiet,

    /// Per-job progress lines and the summary.
    #[default]
    Normal,

    /// Progress plus every line of engine output.
    Verbose,
}

/// Program and argument template for [`EngineKind::Command`].
///
/// Arguments may contain the placeholders `{input}`, `{output}`,
/// `{kernel}` and `{timeout}`.
///
/// ```toml
/// [command]
/// program = "python"
/// args = ["scripts/run_job.py", "{input}", "{output}"]
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    pub program: String,

    #[serde(default)]
    pub args: Vec<String>,
}

/// Locations used by background runs.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BackgroundConfig {
    /// Pid-file recording the detached run.
    #[serde(default = "default_pid_file")]
    pub pid_file: PathBuf,

    /// Combined output of the detached run.
    #[serde(default = "default_background_log")]
    pub log_file: PathBuf,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            pid_file: default_pid_file(),
            log_file: default_background_log(),
        }
    }
}

/// Represents global settings from `.batchbook/config.toml`.
///
/// # Example
///
/// ```toml
/// engine = "papermill"
/// kernel = "python3"
/// continue_on_failure = true
/// timeout_secs = 3600
/// output_dir = "outputs/executed"
/// log_dir = "logs"
///
/// [parameters]
/// session_id = 123
///
/// [background]
/// pid_file = "logs/batchbook.pid"
/// log_file = "logs/batchbook_background.log"
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GlobalConfig {
    #[serde(default)]
    pub engine: EngineKind,

    /// Kernel name handed to the engine.
    #[serde(default = "default_kernel")]
    pub kernel: String,

    #[serde(default = "default_true")]
    pub continue_on_failure: bool,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Ask the engine to keep executing cells after an error (nbconvert).
    #[serde(default)]
    pub allow_errors: bool,

    #[serde(default)]
    pub verbosity: Verbosity,

    /// Directory for executed job outputs.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Directory for per-job logs.
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    /// Working directory of the engine processes (`--cwd` for papermill).
    #[serde(default)]
    pub working_dir: Option<PathBuf>,

    /// Directory arguments expand to the files with this extension.
    #[serde(default = "default_job_extension")]
    pub job_extension: String,

    /// Parameters applied to every job; job-specific values win.
    #[serde(default)]
    pub parameters: Parameters,

    /// Template used when `engine = "command"`.
    #[serde(default)]
    pub command: Option<CommandTemplate>,

    #[serde(default)]
    pub background: BackgroundConfig,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            engine: EngineKind::default(),
            kernel: default_kernel(),
            continue_on_failure: true,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            allow_errors: false,
            verbosity: Verbosity::default(),
            output_dir: default_output_dir(),
            log_dir: default_log_dir(),
            working_dir: None,
            job_extension: default_job_extension(),
            parameters: Parameters::new(),
            command: None,
            background: BackgroundConfig::default(),
        }
    }
}

fn default_kernel() -> String {
    "python3".to_string()
}

fn default_true() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("outputs/executed")
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_job_extension() -> String {
    "ipynb".to_string()
}

fn default_pid_file() -> PathBuf {
    PathBuf::from("logs/batchbook.pid")
}

fn default_background_log() -> PathBuf {
    PathBuf::from("logs/batchbook_background.log")
}
