//! # bb-protocol
//!
//! Core data model definitions for batchbook.
//!
//! This crate defines all shared data structures used for:
//! - Configuration file parsing (`config.toml` settings, `jobs.yaml` job lists)
//! - Job resolution and per-run results
//! - Progress events emitted by the runner
//!
//! ## Modules
//!
//! - [`config_models`]: Global configuration from config.toml
//! - [`job_models`]: Job descriptors, resolved jobs, run identifiers
//! - [`run_models`]: Outcomes, results, sessions and summaries
//! - [`ipc`]: Events sent from the runner to the front end
//!
//! ## Design Principles
//!
//! - Minimal dependencies: only serde, chrono and indexmap
//! - Independent compilation: no dependencies on other batchbook crates

pub mod config_models;
pub mod ipc;
pub mod job_models;
pub mod run_models;

// Re-export all public types for convenience
pub use config_models::*;
pub use ipc::*;
pub use job_models::*;
pub use run_models::*;
