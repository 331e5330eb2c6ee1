//! `jupyter nbconvert --execute` adapter.

use crate::engines::base::{Engine, EngineCommand, ExecutionContext};
use bb_protocol::job_models::JobItem;
use tracing::warn;

/// Executes notebooks in place of papermill when only Jupyter is installed.
///
/// nbconvert cannot inject parameters, so job parameters are ignored with
/// a warning. `--output` is a bare file name resolved against
/// `--output-dir`, which is why both are passed.
pub struct NbconvertEngine {
    program: String,
}

impl NbconvertEngine {
    pub fn new() -> Self {
        Self {
            program: "jupyter".to_string(),
        }
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }
}

impl Default for NbconvertEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for NbconvertEngine {
    fn name(&self) -> &'static str {
        "nbconvert"
    }

    fn program(&self) -> &str {
        &self.program
    }

    fn command(&self, item: &JobItem, context: &ExecutionContext) -> EngineCommand {
        if !item.parameters.is_empty() {
            warn!(
                job = %item.name(),
                count = item.parameters.len(),
                "nbconvert does not support parameters; ignoring them"
            );
        }

        let output_dir = item
            .output
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(|dir| dir.display().to_string())
            .unwrap_or_else(|| ".".to_string());
        let output_name = item
            .output
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| item.output.display().to_string());

        let mut args = vec![
            "nbconvert".to_string(),
            "--to".to_string(),
            "notebook".to_string(),
            "--execute".to_string(),
            item.source.display().to_string(),
            "--output-dir".to_string(),
            output_dir,
            "--output".to_string(),
            output_name,
            format!("--ExecutePreprocessor.timeout={}", context.timeout.as_secs()),
            format!("--ExecutePreprocessor.kernel_name={}", context.kernel),
        ];

        if context.allow_errors {
            args.push("--ExecutePreprocessor.allow_errors=True".to_string());
        }

        EngineCommand {
            program: self.program.clone(),
            args,
            working_dir: context.working_dir.clone(),
        }
    }
}
