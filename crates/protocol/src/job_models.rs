//! Job descriptors and resolved job items.
//!
//! A [`JobSpec`] is what a user writes in `.batchbook/jobs.yaml`; a
//! [`JobItem`] is what the resolver produces for one run, with its output
//! and log paths already derived.

use chrono::Local;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Timestamp format shared by every artifact of a run.
pub const RUN_ID_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Identifier of a single run, derived from its start timestamp.
///
/// All jobs of one run share the same id, which keeps the artifacts of
/// different runs from overwriting each other.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    /// Create a run id from an explicit value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Create a run id from the current local time.
    pub fn now() -> Self {
        Self(Local::now().format(RUN_ID_FORMAT).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single parameter value passed to the execution engine.
///
/// Untagged so that `jobs.yaml` can use plain scalars:
///
/// ```yaml
/// parameters:
///   fold: 3
///   fast: true
///   target: price
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Str(value) => f.write_str(value),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

/// Ordered mapping of parameter name to value.
pub type Parameters = IndexMap<String, ParamValue>;

/// A configured job: an input path plus job-specific parameters.
///
/// This is the entry type of the built-in job list.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct JobSpec {
    /// Path to the job input (usually a notebook).
    pub path: PathBuf,

    /// Parameters passed to the engine for this job only.
    #[serde(default)]
    pub parameters: Parameters,
}

impl JobSpec {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            parameters: Parameters::new(),
        }
    }
}

/// A dataset the jobs depend on.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DatasetSpec {
    /// Dataset identifier, e.g. `owner/dataset-name`.
    pub id: String,

    /// Directory the dataset is unpacked into.
    pub dest: PathBuf,

    /// Human readable label used in progress output.
    #[serde(default)]
    pub description: String,
}

/// Contents of `.batchbook/jobs.yaml`.
///
/// # Example
///
/// ```yaml
/// jobs:
///   - path: notebooks/regression.ipynb
///     parameters:
///       fold: 3
///   - path: notebooks/clustering.ipynb
/// datasets:
///   - id: camnugent/california-housing-prices
///     dest: datasets/regression
///     description: "Regression: California Housing Prices"
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct JobsFile {
    #[serde(default)]
    pub jobs: Vec<JobSpec>,

    #[serde(default)]
    pub datasets: Vec<DatasetSpec>,
}

/// A resolved unit of work.
///
/// Created by the resolver and never modified afterwards.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct JobItem {
    /// Path of the job input.
    pub source: PathBuf,

    /// Where the engine writes the executed copy.
    pub output: PathBuf,

    /// Where combined stdout and stderr of the engine are captured.
    pub log: PathBuf,

    /// Parameters passed to the engine, in order.
    #[serde(default)]
    pub parameters: Parameters,
}

impl JobItem {
    /// File name of the job input, used as the display name.
    pub fn name(&self) -> String {
        self.source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.source.display().to_string())
    }

    pub fn log_path(&self) -> &Path {
        &self.log
    }
}
