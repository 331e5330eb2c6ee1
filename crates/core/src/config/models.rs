//! Configuration models that aggregate all settings.
//!
//! This module provides the unified `AppConfig` structure that combines
//! global settings, the built-in job list and the dataset list into a
//! single configuration object.

use crate::resolver::OutputLayout;
use bb_protocol::config_models::GlobalConfig;
use bb_protocol::job_models::{DatasetSpec, JobSpec};
use bb_protocol::run_models::RunPolicy;
use std::time::Duration;

/// Notebooks run by `run-all` when no `jobs.yaml` exists, in order.
pub const DEFAULT_JOBS: [&str; 5] = [
    "notebooks/regression.ipynb",
    "notebooks/clustering.ipynb",
    "notebooks/anomaly-detection.ipynb",
    "notebooks/association.ipynb",
    "notebooks/time-series-forecasting.ipynb",
];

/// `(id, destination, description)` of the datasets the default jobs read.
pub const DEFAULT_DATASETS: [(&str, &str, &str); 5] = [
    (
        "camnugent/california-housing-prices",
        "datasets/regression",
        "Regression: California Housing Prices",
    ),
    (
        "vjchoudhary7/customer-segmentation-tutorial-in-python",
        "datasets/clustering",
        "Clustering: Mall Customer Segmentation",
    ),
    (
        "mlg-ulb/creditcardfraud",
        "datasets/anomaly",
        "Anomaly Detection: Credit Card Fraud",
    ),
    (
        "heeraldedhia/groceries-dataset",
        "datasets/association",
        "Association Rules: Groceries Dataset",
    ),
    (
        "robikscube/hourly-energy-consumption",
        "datasets/timeseries",
        "Time Series: Hourly Energy Consumption",
    ),
];

/// Unified application configuration loaded from the `.batchbook/` directory.
///
/// - `config.toml`: Global settings
/// - `jobs.yaml`: The built-in job list and the datasets it needs
///
/// # Example
///
/// ```rust,no_run
/// use bb_core::config::loader::load_config;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new(".")).await?;
/// println!("{} built-in jobs", config.jobs.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Global settings from `config.toml`.
    pub global: GlobalConfig,

    /// Built-in job list, used when no explicit paths are given.
    pub jobs: Vec<JobSpec>,

    /// Datasets fetched by `batchbook download`.
    pub datasets: Vec<DatasetSpec>,
}

impl AppConfig {
    /// Failure handling and timeout taken from the global settings.
    pub fn policy(&self) -> RunPolicy {
        RunPolicy {
            continue_on_failure: self.global.continue_on_failure,
            timeout_per_job: Duration::from_secs(self.global.timeout_secs),
        }
    }

    /// Output and log directories taken from the global settings.
    pub fn layout(&self) -> OutputLayout {
        OutputLayout::new(&self.global.output_dir, &self.global.log_dir)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            global: GlobalConfig::default(),
            jobs: default_jobs(),
            datasets: default_datasets(),
        }
    }
}

pub fn default_jobs() -> Vec<JobSpec> {
    DEFAULT_JOBS.iter().map(|path| JobSpec::new(*path)).collect()
}

pub fn default_datasets() -> Vec<DatasetSpec> {
    DEFAULT_DATASETS
        .iter()
        .map(|(id, dest, description)| DatasetSpec {
            id: (*id).to_string(),
            dest: (*dest).into(),
            description: (*description).to_string(),
        })
        .collect()
}
