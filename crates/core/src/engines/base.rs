//! Base Engine trait and supporting types.

use bb_protocol::job_models::JobItem;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Settings shared by every job of a run, handed to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionContext {
    /// Kernel name for notebook engines.
    pub kernel: String,

    /// Per-job timeout, forwarded to engines that enforce their own.
    pub timeout: Duration,

    /// Keep executing after a cell error (nbconvert only).
    pub allow_errors: bool,

    /// Working directory of the engine process; inherits when `None`.
    pub working_dir: Option<PathBuf>,
}

impl ExecutionContext {
    /// Create a context with the given kernel and timeout.
    ///
    /// Defaults:
    /// - allow_errors: false
    /// - working_dir: inherited from the runner
    pub fn new(kernel: impl Into<String>, timeout: Duration) -> Self {
        Self {
            kernel: kernel.into(),
            timeout,
            allow_errors: false,
            working_dir: None,
        }
    }

    pub fn with_allow_errors(mut self, allow_errors: bool) -> Self {
        self.allow_errors = allow_errors;
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }
}

/// A fully built engine invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCommand {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
}

impl fmt::Display for EngineCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " '{arg}'")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Engine not available: '{program}' was not found on PATH")]
    NotAvailable { program: String },
    #[error("Invalid engine configuration: {0}")]
    InvalidConfig(String),
}

/// An external tool that executes one job per invocation.
pub trait Engine: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Executable that [`Engine::command`] invokes.
    fn program(&self) -> &str;

    /// Build the invocation for `item`.
    fn command(&self, item: &JobItem, context: &ExecutionContext) -> EngineCommand;

    /// Resolve [`Engine::program`] on `PATH`.
    fn check_availability(&self) -> Result<PathBuf, EngineError> {
        which::which(self.program()).map_err(|_| EngineError::NotAvailable {
            program: self.program().to_string(),
        })
    }
}
