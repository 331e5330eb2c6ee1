//! Configuration file loader for the `.batchbook/` directory structure.
//!
//! This module loads and validates:
//! - `config.toml`: Global settings
//! - `jobs.yaml` (or `jobs.yml`): Built-in job list and datasets

use crate::config::error::ConfigError;
use crate::config::error::ConfigResult;
use crate::config::models::AppConfig;
use crate::config::models::{default_datasets, default_jobs};
use bb_protocol::config_models::{EngineKind, GlobalConfig};
use bb_protocol::job_models::JobsFile;
use std::path::{Path, PathBuf};

/// Name of the configuration directory under a project root.
pub const CONFIG_DIR: &str = ".batchbook";

/// Loads all configuration from the `.batchbook/` directory under `root`.
///
/// # Returns
///
/// An `AppConfig` containing all loaded configuration. If the directory or
/// individual files are missing, the corresponding defaults are used rather
/// than returning an error.
///
/// # Errors
///
/// Returns `ConfigError` if:
/// - Files exist but cannot be read
/// - Files have invalid TOML or YAML syntax
/// - Settings are inconsistent (zero timeout, command engine without a template)
///
/// # Example
///
/// ```rust,no_run
/// use bb_core::config::loader::load_config;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new(".")).await?;
/// println!("engine: {}", config.global.engine);
/// # Ok(())
/// # }
/// ```
pub async fn load_config(root: &Path) -> ConfigResult<AppConfig> {
    load_config_dir(&root.join(CONFIG_DIR)).await
}

/// Loads configuration from an explicit configuration directory.
pub async fn load_config_dir(config_dir: &Path) -> ConfigResult<AppConfig> {
    if !config_dir.exists() {
        return Ok(AppConfig::default());
    }

    let global = load_global_config(config_dir)?;

    let jobs_file = load_jobs_file(config_dir)?;
    let (jobs, datasets) = match jobs_file {
        Some(file) => (file.jobs, file.datasets),
        None => (default_jobs(), default_datasets()),
    };

    Ok(AppConfig {
        global,
        jobs,
        datasets,
    })
}

/// Loads global configuration from `config.toml`.
fn load_global_config(config_dir: &Path) -> ConfigResult<GlobalConfig> {
    let config_path = config_dir.join("config.toml");

    if !config_path.exists() {
        return Ok(GlobalConfig::default());
    }

    let content =
        std::fs::read_to_string(&config_path).map_err(|source| ConfigError::Read {
            path: config_path.clone(),
            source,
        })?;

    let config: GlobalConfig =
        toml::from_str(&content).map_err(|source| ConfigError::Settings {
            path: config_path.clone(),
            source,
        })?;

    validate_global_config(&config, &config_path)?;

    Ok(config)
}

fn validate_global_config(config: &GlobalConfig, path: &Path) -> ConfigResult<()> {
    if config.timeout_secs == 0 {
        return Err(ConfigError::Invalid {
            path: path.to_path_buf(),
            reason: "timeout_secs must be greater than zero".to_string(),
        });
    }

    if config.engine == EngineKind::Command && config.command.is_none() {
        return Err(ConfigError::Invalid {
            path: path.to_path_buf(),
            reason: "engine = \"command\" requires a [command] section".to_string(),
        });
    }

    Ok(())
}

/// Loads `jobs.yaml`, falling back to `jobs.yml`. `None` when neither exists.
fn load_jobs_file(config_dir: &Path) -> ConfigResult<Option<JobsFile>> {
    let Some(jobs_path) = find_jobs_file(config_dir) else {
        return Ok(None);
    };

    let content = std::fs::read_to_string(&jobs_path).map_err(|source| ConfigError::Read {
        path: jobs_path.clone(),
        source,
    })?;

    // An empty file is an empty job list, not a parse error.
    if content.trim().is_empty() {
        return Ok(Some(JobsFile::default()));
    }

    let file: JobsFile =
        serde_yaml::from_str(&content).map_err(|source| ConfigError::JobList {
            path: jobs_path.clone(),
            source,
        })?;

    if let Some(job) = file.jobs.iter().find(|job| job.path.as_os_str().is_empty()) {
        return Err(ConfigError::Invalid {
            path: jobs_path,
            reason: format!("job entry with empty path: {job:?}"),
        });
    }

    Ok(Some(file))
}

fn find_jobs_file(config_dir: &Path) -> Option<PathBuf> {
    ["jobs.yaml", "jobs.yml"]
        .iter()
        .map(|name| config_dir.join(name))
        .find(|path| path.exists())
}
