//! Execution engine abstraction.
//!
//! This module provides the [`Engine`] trait (Adapter Pattern), one adapter
//! per supported tool, and the [`EngineFactory`] that picks one from the
//! configuration. Engines only describe the command to run; spawning,
//! output capture and timeouts live in [`process`].

pub mod base;
pub mod command;
pub mod factory;
pub mod nbconvert;
pub mod papermill;
pub mod process;

pub use base::{Engine, EngineCommand, EngineError, ExecutionContext};
pub use command::CommandEngine;
pub use factory::EngineFactory;
pub use nbconvert::NbconvertEngine;
pub use papermill::PapermillEngine;
pub use process::{ProcessExecutor, ProcessExit};
