//! Initialization module for creating `.batchbook` directory structures.
//!
//! This module scaffolds a new project by generating a `.batchbook/`
//! directory with commented templates for:
//! - Global configuration (`config.toml`)
//! - The built-in job list and datasets (`jobs.yaml`)
//!
//! # Example
//!
//! ```no_run
//! use bb_core::init::{InitOptions, generate_project_structure};
//! use std::path::PathBuf;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let options = InitOptions {
//!     target_dir: PathBuf::from("."),
//!     force: false,
//!     minimal: false,
//! };
//!
//! generate_project_structure(options).await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod generator;
pub mod templates;

pub use error::{InitError, InitResult};
pub use generator::{generate_project_structure, InitOptions};
pub use templates::{get_template, list_templates};
