//! Errors raised while loading `.batchbook/`.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// `config.toml` is not valid TOML or has fields of the wrong type.
    #[error("Malformed settings in {path}: {source}")]
    Settings {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// `jobs.yaml` is not valid YAML or does not describe a job list.
    #[error("Malformed job list in {path}: {source}")]
    JobList {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    /// The file parsed but its values cannot be used together.
    #[error("Invalid configuration in {path}: {reason}")]
    Invalid { path: PathBuf, reason: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;
