//! Dataset downloads.
//!
//! A thin wrapper over the `kaggle` command-line client. Each dataset is
//! fetched independently and unzipped into its destination directory; one
//! failed download does not stop the others.

use async_trait::async_trait;
use bb_protocol::job_models::DatasetSpec;
use bb_protocol::run_models::{EXIT_FAILURE, EXIT_SUCCESS};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;
use tracing::{info, warn};

/// Environment variables that may carry credentials instead of a file.
pub const KAGGLE_USERNAME_VAR: &str = "KAGGLE_USERNAME";
pub const KAGGLE_KEY_VAR: &str = "KAGGLE_KEY";
/// Overrides the directory holding `kaggle.json`.
pub const KAGGLE_CONFIG_DIR_VAR: &str = "KAGGLE_CONFIG_DIR";

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error(
        "Kaggle credentials not found. Place kaggle.json in {expected} or set \
         KAGGLE_USERNAME and KAGGLE_KEY"
    )]
    MissingCredentials { expected: PathBuf },

    #[error("Failed to create {path}: {source}")]
    DirectoryCreate {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to start '{program}': {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("Download of {id} failed (exit code {code:?}): {stderr}")]
    Failed {
        id: String,
        code: Option<i32>,
        stderr: String,
    },
}

/// Where credentials were found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    Environment,
    File(PathBuf),
}

/// Locate Kaggle credentials without reading them.
///
/// Checks `KAGGLE_USERNAME`/`KAGGLE_KEY` first, then `kaggle.json` under
/// `KAGGLE_CONFIG_DIR` or `~/.kaggle`.
pub fn check_credentials() -> Result<Credentials, DownloadError> {
    let from_env = |name: &str| std::env::var(name).is_ok_and(|value| !value.is_empty());
    if from_env(KAGGLE_USERNAME_VAR) && from_env(KAGGLE_KEY_VAR) {
        return Ok(Credentials::Environment);
    }

    let config_dir = std::env::var_os(KAGGLE_CONFIG_DIR_VAR)
        .map(PathBuf::from)
        .or_else(|| dirs::home_dir().map(|home| home.join(".kaggle")))
        .unwrap_or_else(|| PathBuf::from(".kaggle"));
    credentials_in(&config_dir)
}

fn credentials_in(config_dir: &Path) -> Result<Credentials, DownloadError> {
    let file = config_dir.join("kaggle.json");
    if file.is_file() {
        Ok(Credentials::File(file))
    } else {
        Err(DownloadError::MissingCredentials { expected: file })
    }
}

/// Something that can fetch a dataset into a directory.
#[async_trait]
pub trait DatasetSource: Send + Sync {
    async fn download(&self, dataset: &DatasetSpec) -> Result<(), DownloadError>;
}

/// `kaggle datasets download -d <id> -p <dest> --unzip`
pub struct KaggleCli {
    program: String,
}

impl KaggleCli {
    pub fn new() -> Self {
        Self {
            program: "kaggle".to_string(),
        }
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(dataset: &DatasetSpec) -> Vec<String> {
        vec![
            "datasets".to_string(),
            "download".to_string(),
            "-d".to_string(),
            dataset.id.clone(),
            "-p".to_string(),
            dataset.dest.display().to_string(),
            "--unzip".to_string(),
        ]
    }
}

impl Default for KaggleCli {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DatasetSource for KaggleCli {
    async fn download(&self, dataset: &DatasetSpec) -> Result<(), DownloadError> {
        tokio::fs::create_dir_all(&dataset.dest)
            .await
            .map_err(|source| DownloadError::DirectoryCreate {
                path: dataset.dest.clone(),
                source,
            })?;

        let output = Command::new(&self.program)
            .args(Self::args(dataset))
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| DownloadError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if output.status.success() {
            Ok(())
        } else {
            Err(DownloadError::Failed {
                id: dataset.id.clone(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

/// Progress notifications from [`download_all`].
#[derive(Debug)]
pub enum DownloadProgress<'a> {
    Started {
        index: usize,
        total: usize,
        dataset: &'a DatasetSpec,
    },
    Finished {
        dataset: &'a DatasetSpec,
        result: Result<(), &'a DownloadError>,
    },
}

/// Outcome of downloading a list of datasets.
#[derive(Debug, Default)]
pub struct DownloadSummary {
    pub succeeded: Vec<DatasetSpec>,
    pub failed: Vec<(DatasetSpec, DownloadError)>,
}

impl DownloadSummary {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            EXIT_SUCCESS
        } else {
            EXIT_FAILURE
        }
    }
}

/// Download every dataset in order, reporting progress as it goes.
pub async fn download_all<F>(
    source: &dyn DatasetSource,
    datasets: &[DatasetSpec],
    mut on_progress: F,
) -> DownloadSummary
where
    F: FnMut(DownloadProgress<'_>),
{
    let mut summary = DownloadSummary::default();
    let total = datasets.len();

    for (index, dataset) in datasets.iter().enumerate() {
        on_progress(DownloadProgress::Started {
            index,
            total,
            dataset,
        });

        match source.download(dataset).await {
            Ok(()) => {
                info!(id = %dataset.id, dest = %dataset.dest.display(), "dataset downloaded");
                on_progress(DownloadProgress::Finished {
                    dataset,
                    result: Ok(()),
                });
                summary.succeeded.push(dataset.clone());
            }
            Err(e) => {
                warn!(id = %dataset.id, error = %e, "dataset download failed");
                on_progress(DownloadProgress::Finished {
                    dataset,
                    result: Err(&e),
                });
                summary.failed.push((dataset.clone(), e));
            }
        }
    }

    summary
}
