//! Configuration loading and management.
//!
//! This module provides functionality to load and parse the configuration
//! files from the `.batchbook/` directory.

pub mod error;
pub mod loader;
pub mod models;
