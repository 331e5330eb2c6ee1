//! Generates the `.batchbook/` directory from embedded templates.

use super::error::{InitError, InitResult};
use super::templates::get_template;
use crate::config::loader::CONFIG_DIR;
use std::fs;
use std::path::{Path, PathBuf};

/// Options for `batchbook init`.
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// Project root that receives the `.batchbook/` directory.
    pub target_dir: PathBuf,

    /// Overwrite an existing `.batchbook/` directory.
    pub force: bool,

    /// Only write `config.toml`; the built-in job list stays at its defaults.
    pub minimal: bool,
}

/// Generates the `.batchbook/` directory structure.
///
/// ```text
/// .batchbook/
/// ├── config.toml
/// └── jobs.yaml (unless minimal)
/// ```
///
/// # Errors
///
/// - The `.batchbook` directory already exists (without force flag)
/// - A template file cannot be found
/// - File system operations fail
pub async fn generate_project_structure(options: InitOptions) -> InitResult<()> {
    let bb_dir = options.target_dir.join(CONFIG_DIR);

    if bb_dir.exists() && !options.force {
        return Err(InitError::DirectoryExists(bb_dir));
    }

    fs::create_dir_all(&bb_dir).map_err(|source| InitError::DirectoryCreate {
        path: bb_dir.clone(),
        source,
    })?;

    write_template_file(&bb_dir, "config.toml")?;

    if !options.minimal {
        write_template_file(&bb_dir, "jobs.yaml")?;
    }

    Ok(())
}

fn write_template_file(bb_dir: &Path, template_path: &str) -> InitResult<()> {
    let content = get_template(template_path)
        .ok_or_else(|| InitError::TemplateNotFound(template_path.to_string()))?;

    let target_path = bb_dir.join(template_path);

    if let Some(parent) = target_path.parent() {
        fs::create_dir_all(parent).map_err(|source| InitError::DirectoryCreate {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    fs::write(&target_path, content).map_err(|source| InitError::FileWrite {
        path: target_path,
        source,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::loader::load_config;
    use crate::config::models::DEFAULT_JOBS;
    use tempfile::tempdir;

    fn options(dir: &Path, force: bool, minimal: bool) -> InitOptions {
        InitOptions {
            target_dir: dir.to_path_buf(),
            force,
            minimal,
        }
    }

    /// RED: A full init writes both files and the result loads back.
    #[tokio::test]
    async fn test_generate_structure_success() {
        let dir = tempdir().expect("Failed to create temp dir");

        let result = generate_project_structure(options(dir.path(), false, false)).await;
        assert!(result.is_ok(), "Failed: {:?}", result.err());

        let bb_dir = dir.path().join(CONFIG_DIR);
        assert!(bb_dir.join("config.toml").exists());
        assert!(bb_dir.join("jobs.yaml").exists());

        let config = load_config(dir.path())
            .await
            .expect("Generated config should load");
        assert_eq!(config.jobs.len(), DEFAULT_JOBS.len());
        assert_eq!(config.datasets.len(), 5);
    }

    #[tokio::test]
    async fn test_generate_minimal_structure() {
        let dir = tempdir().expect("Failed to create temp dir");

        generate_project_structure(options(dir.path(), false, true))
            .await
            .expect("Minimal init should succeed");

        let bb_dir = dir.path().join(CONFIG_DIR);
        assert!(bb_dir.join("config.toml").exists());
        assert!(!bb_dir.join("jobs.yaml").exists());
    }

    #[tokio::test]
    async fn test_generate_fails_if_exists() {
        let dir = tempdir().expect("Failed to create temp dir");
        fs::create_dir(dir.path().join(CONFIG_DIR)).expect("Failed to create dir");

        let result = generate_project_structure(options(dir.path(), false, false)).await;

        assert!(matches!(result, Err(InitError::DirectoryExists(_))));
    }

    #[tokio::test]
    async fn test_generate_with_force_overwrites() {
        let dir = tempdir().expect("Failed to create temp dir");
        let bb_dir = dir.path().join(CONFIG_DIR);
        fs::create_dir(&bb_dir).expect("Failed to create dir");
        fs::write(bb_dir.join("config.toml"), "kernel = \"old\"").expect("Failed to write");

        generate_project_structure(options(dir.path(), true, false))
            .await
            .expect("Force init should succeed");

        let config = fs::read_to_string(bb_dir.join("config.toml")).expect("Failed to read");
        assert!(config.contains("kernel = \"python3\""));
    }
}
