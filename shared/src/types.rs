//! Core shared types and identifiers

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

use crate::errors::{SharedError, SharedResult};

/// Harness component emitting a log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Component {
    Cli,
    Renderer,
    Compose,
    Prober,
    Lifecycle,
    Registrar,
    Client,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Cli => write!(f, "cli"),
            Component::Renderer => write!(f, "renderer"),
            Component::Compose => write!(f, "compose"),
            Component::Prober => write!(f, "prober"),
            Component::Lifecycle => write!(f, "lifecycle"),
            Component::Registrar => write!(f, "registrar"),
            Component::Client => write!(f, "client"),
        }
    }
}

/// Where the platform under test lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunMode {
    /// Stand up a disposable sandbox with the compose tool
    Local,
    /// Talk to an already running platform
    Remote { endpoint: ServiceEndpoint },
}

impl RunMode {
    pub fn is_local(&self) -> bool {
        matches!(self, RunMode::Local)
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::Local => write!(f, "local"),
            RunMode::Remote { endpoint } => write!(f, "remote ({endpoint})"),
        }
    }
}

/// Reachable host/port pair of the target service
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceEndpoint {
    pub host: String,
    pub port: u16,
}

impl ServiceEndpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Parse a platform address.
    ///
    /// Accepts `http://host:port`, `https://host:port`, `dns:///host:port` and
    /// bare `host:port`. A missing port falls back to the scheme default.
    pub fn parse(input: &str) -> SharedResult<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(SharedError::InvalidEndpoint {
                input: input.to_string(),
                reason: "address is empty".to_string(),
            });
        }

        let normalized = match trimmed.strip_prefix("dns:///") {
            Some(rest) => format!("http://{rest}"),
            None if !trimmed.contains("://") => format!("http://{trimmed}"),
            None => trimmed.to_string(),
        };

        let url = Url::parse(&normalized).map_err(|e| SharedError::InvalidEndpoint {
            input: input.to_string(),
            reason: e.to_string(),
        })?;

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| SharedError::InvalidEndpoint {
                input: input.to_string(),
                reason: "missing host".to_string(),
            })?;

        let port = url
            .port_or_known_default()
            .ok_or_else(|| SharedError::InvalidEndpoint {
                input: input.to_string(),
                reason: "missing port".to_string(),
            })?;

        Ok(Self::new(host, port))
    }

    /// `host:port` form used for environment variables and gRPC targets
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Display for ServiceEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}
