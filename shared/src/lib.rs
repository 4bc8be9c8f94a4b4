//! Shared types for the Flyte integration-test harness
//!
//! Contains the identifiers, endpoint type and logging setup used by every
//! harness component.

pub mod errors;
pub mod logging;
pub mod types;

pub use errors::*;
pub use types::*;
