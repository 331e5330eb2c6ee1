//! # bb-core
//!
//! Core batch execution logic for batchbook.
//!
//! This crate provides:
//! - Configuration loading from the `.batchbook/` directory
//! - Job list resolution with deterministic output and log naming
//! - Execution engine adapters (papermill, nbconvert, custom command)
//! - The sequential batch runner with per-job timeouts
//! - The background supervisor guarding a single detached run
//! - A thin dataset downloader over the `kaggle` CLI
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading and management
//! - [`init`]: `.batchbook/` project scaffolding
//! - [`resolver`]: Job list resolution
//! - [`engines`]: Engine trait and adapter implementations
//! - [`runner`]: Sequential batch runner
//! - [`state`]: Run session state transitions
//! - [`supervisor`]: Background run supervision and pid-file locking
//! - [`datasets`]: Dataset downloads

pub mod config;
pub mod datasets;
pub mod engines;
pub mod init;
pub mod resolver;
pub mod runner;
pub mod state;
pub mod supervisor;
