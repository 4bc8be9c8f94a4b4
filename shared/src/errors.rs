//! Shared error types for the test harness workspace

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SharedError {
    #[error("Invalid endpoint '{input}': {reason}")]
    InvalidEndpoint { input: String, reason: String },
}

pub type SharedResult<T> = Result<T, SharedError>;
