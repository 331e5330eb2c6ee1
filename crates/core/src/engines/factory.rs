//! Engine factory for creating engine instances from configuration.

use crate::engines::base::{Engine, EngineError};
use crate::engines::command::CommandEngine;
use crate::engines::nbconvert::NbconvertEngine;
use crate::engines::papermill::PapermillEngine;
use anyhow::Result;
use bb_protocol::config_models::{EngineKind, GlobalConfig};
use std::sync::Arc;

/// Factory for creating engine instances based on configuration.
pub struct EngineFactory;

impl EngineFactory {
    /// Create the engine selected by `config.engine`.
    ///
    /// - `papermill` → [`PapermillEngine`]
    /// - `nbconvert` → [`NbconvertEngine`]
    /// - `command` → [`CommandEngine`] built from `config.command`
    ///
    /// # Examples
    ///
    /// ```
    /// use bb_core::engines::EngineFactory;
    /// use bb_protocol::config_models::GlobalConfig;
    ///
    /// let engine = EngineFactory::create(&GlobalConfig::default()).unwrap();
    /// assert_eq!(engine.name(), "papermill");
    /// ```
    pub fn create(config: &GlobalConfig) -> Result<Arc<dyn Engine>> {
        Self::create_kind(config.engine, config)
    }

    /// Create a specific engine kind, e.g. when overridden on the command line.
    pub fn create_kind(kind: EngineKind, config: &GlobalConfig) -> Result<Arc<dyn Engine>> {
        match kind {
            EngineKind::Papermill => Ok(Arc::new(PapermillEngine::new())),
            EngineKind::Nbconvert => Ok(Arc::new(NbconvertEngine::new())),
            EngineKind::Command => {
                let template = config.command.clone().ok_or_else(|| {
                    EngineError::InvalidConfig(
                        "engine \"command\" requires a [command] section in config.toml"
                            .to_string(),
                    )
                })?;
                if template.program.trim().is_empty() {
                    return Err(EngineError::InvalidConfig(
                        "[command] program must not be empty".to_string(),
                    )
                    .into());
                }
                Ok(Arc::new(CommandEngine::new(template)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bb_protocol::config_models::CommandTemplate;

    #[test]
    fn test_factory_creates_each_kind() {
        let mut config = GlobalConfig::default();

        let engine = EngineFactory::create(&config).expect("papermill");
        assert_eq!(engine.name(), "papermill");
        assert_eq!(engine.program(), "papermill");

        config.engine = EngineKind::Nbconvert;
        let engine = EngineFactory::create(&config).expect("nbconvert");
        assert_eq!(engine.program(), "jupyter");

        config.engine = EngineKind::Command;
        config.command = Some(CommandTemplate {
            program: "sh".to_string(),
            args: vec!["{input}".to_string()],
        });
        let engine = EngineFactory::create(&config).expect("command");
        assert_eq!(engine.name(), "command");
        assert_eq!(engine.program(), "sh");
    }

    #[test]
    fn test_factory_command_without_template_fails() {
        let result = EngineFactory::create_kind(EngineKind::Command, &GlobalConfig::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_factory_command_with_empty_program_fails() {
        let config = GlobalConfig {
            command: Some(CommandTemplate {
                program: "  ".to_string(),
                args: Vec::new(),
            }),
            ..GlobalConfig::default()
        };

        assert!(EngineFactory::create_kind(EngineKind::Command, &config).is_err());
    }
}
