//! Common test utilities shared by the integration tests.
//!
//! - Fixtures: temporary projects with scripted jobs
//! - Assertions over event sequences and summaries

pub mod assertions;
pub mod fixtures;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;
