//! Harness-specific error types

use shared::SharedError;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("Template '{template}' failed to render: {message}")]
    Template { template: String, message: String },

    #[error("Command `{command}` exited with {}:\n{output}", exit_code_text(.exit_code))]
    Subprocess {
        command: String,
        exit_code: Option<i32>,
        output: String,
    },

    #[error("Could not resolve published port for {service}:{private_port} from output: {output}")]
    PortResolution {
        service: String,
        private_port: u16,
        output: String,
    },

    #[error("Service '{service}' not ready after {timeout:?} ({attempts} attempts)")]
    ReadinessTimeout {
        service: String,
        timeout: Duration,
        attempts: u32,
    },

    #[error("Configuration error: {field}: {message}")]
    Configuration { field: String, message: String },

    #[error("Session is {actual}, expected {expected}")]
    InvalidState { expected: String, actual: String },

    #[error("Shared component error: {0}")]
    Shared(#[from] SharedError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

fn exit_code_text(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "no exit code".to_string(),
    }
}

impl HarnessError {
    pub fn config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn template(template: impl Into<String>, source: &minijinja::Error) -> Self {
        // minijinja's alternate Display includes the failing line and the undefined name
        Self::Template {
            template: template.into(),
            message: format!("{source:#}"),
        }
    }
}

pub type HarnessResult<T> = Result<T, HarnessError>;
