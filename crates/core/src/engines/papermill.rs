//! Papermill adapter.

use crate::engines::base::{Engine, EngineCommand, ExecutionContext};
use bb_protocol::job_models::JobItem;

/// Executes notebooks with `papermill`, injecting parameters.
///
/// ```text
/// papermill <in> <out> -k <kernel> -p <name> <value> ... --execution-timeout <secs> [--cwd <dir>] --log-output
/// ```
pub struct PapermillEngine {
    program: String,
}

impl PapermillEngine {
    pub fn new() -> Self {
        Self {
            program: "papermill".to_string(),
        }
    }

    /// Use a specific executable instead of `papermill` from `PATH`.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }
}

impl Default for PapermillEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for PapermillEngine {
    fn name(&self) -> &'static str {
        "papermill"
    }

    fn program(&self) -> &str {
        &self.program
    }

    fn command(&self, item: &JobItem, context: &ExecutionContext) -> EngineCommand {
        let mut args = vec![
            item.source.display().to_string(),
            item.output.display().to_string(),
            "-k".to_string(),
            context.kernel.clone(),
        ];

        for (name, value) in &item.parameters {
            args.push("-p".to_string());
            args.push(name.clone());
            args.push(value.to_string());
        }

        args.push("--execution-timeout".to_string());
        args.push(context.timeout.as_secs().to_string());
        if let Some(dir) = &context.working_dir {
            args.push("--cwd".to_string());
            args.push(dir.display().to_string());
        }
        args.push("--log-output".to_string());

        EngineCommand {
            program: self.program.clone(),
            args,
            working_dir: context.working_dir.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bb_protocol::job_models::{ParamValue, Parameters};
    use std::path::PathBuf;
    use std::time::Duration;

    fn item(parameters: Parameters) -> JobItem {
        JobItem {
            source: PathBuf::from("notebooks/regression.ipynb"),
            output: PathBuf::from("out/regression_executed_1.ipynb"),
            log: PathBuf::from("logs/regression_1.log"),
            parameters,
        }
    }

    #[test]
    fn test_command_without_parameters() {
        let engine = PapermillEngine::new();
        let context = ExecutionContext::new("python3", Duration::from_secs(600));

        let command = engine.command(&item(Parameters::new()), &context);

        assert_eq!(command.program, "papermill");
        assert_eq!(
            command.args,
            vec![
                "notebooks/regression.ipynb",
                "out/regression_executed_1.ipynb",
                "-k",
                "python3",
                "--execution-timeout",
                "600",
                "--log-output",
            ]
        );
    }

    #[test]
    fn test_command_passes_parameters_in_order() {
        let mut parameters = Parameters::new();
        parameters.insert("target".into(), ParamValue::from("price"));
        parameters.insert("fold".into(), ParamValue::Int(3));

        let engine = PapermillEngine::new().with_program("/opt/bin/papermill");
        let context = ExecutionContext::new("ml", Duration::from_secs(5));
        let command = engine.command(&item(parameters), &context);

        assert_eq!(command.program, "/opt/bin/papermill");
        let params: Vec<&str> = command.args[4..10].iter().map(String::as_str).collect();
        assert_eq!(params, vec!["-p", "target", "price", "-p", "fold", "3"]);
    }

    #[test]
    fn test_working_dir_becomes_cwd() {
        let engine = PapermillEngine::new();
        let context =
            ExecutionContext::new("python3", Duration::from_secs(60)).with_working_dir("notebooks");

        let command = engine.command(&item(Parameters::new()), &context);

        let cwd = command
            .args
            .iter()
            .position(|arg| arg == "--cwd")
            .expect("--cwd should be present");
        assert_eq!(command.args[cwd + 1], "notebooks");
        assert_eq!(command.working_dir, Some(PathBuf::from("notebooks")));
    }
}
