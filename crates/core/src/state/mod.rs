//! State management for batch runs.
//!
//! This module provides the run session state machine: every transition
//! mutates the [`RunSession`](bb_protocol::run_models::RunSession) and emits
//! the matching progress event.

pub mod session;
