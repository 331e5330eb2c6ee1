//! User-defined command adapter.

use crate::engines::base::{Engine, EngineCommand, ExecutionContext};
use bb_protocol::config_models::CommandTemplate;
use bb_protocol::job_models::JobItem;

/// Runs an arbitrary program built from a [`CommandTemplate`].
///
/// The placeholders `{input}`, `{output}`, `{kernel}` and `{timeout}` are
/// substituted in every argument; parameters are appended as
/// `--<name>=<value>`.
pub struct CommandEngine {
    template: CommandTemplate,
}

impl CommandEngine {
    pub fn new(template: CommandTemplate) -> Self {
        Self { template }
    }

    fn expand(arg: &str, item: &JobItem, context: &ExecutionContext) -> String {
        arg.replace("{input}", &item.source.display().to_string())
            .replace("{output}", &item.output.display().to_string())
            .replace("{kernel}", &context.kernel)
            .replace("{timeout}", &context.timeout.as_secs().to_string())
    }
}

impl Engine for CommandEngine {
    fn name(&self) -> &'static str {
        "command"
    }

    fn program(&self) -> &str {
        &self.template.program
    }

    fn command(&self, item: &JobItem, context: &ExecutionContext) -> EngineCommand {
        let mut args: Vec<String> = self
            .template
            .args
            .iter()
            .map(|arg| Self::expand(arg, item, context))
            .collect();

        args.extend(
            item.parameters
                .iter()
                .map(|(name, value)| format!("--{name}={value}")),
        );

        EngineCommand {
            program: self.template.program.clone(),
            args,
            working_dir: context.working_dir.clone(),
        }
    }
}
