//! Session Configuration
//!
//! Immutable, validated options for one harness session.

use std::path::PathBuf;
use std::time::Duration;

use shared::RunMode;

use crate::runtime::registrar::{Registration, WorkloadSource};

/// Directory under the root dir holding rendered artifacts
pub const CACHE_DIR_NAME: &str = ".flyte_harness";
/// Compose service running the sandbox
pub const BACKEND_SERVICE: &str = "backend";
/// Container port of the admin service
pub const ADMIN_PORT: u16 = 30081;
/// Probe executed inside the backend container
pub const READINESS_COMMAND: &str = "wait-for-flyte.sh";

pub const DEFAULT_PROJECT: &str = "flytesnacks";
pub const DEFAULT_DOMAIN: &str = "development";

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub mode: RunMode,
    pub root_dir: PathBuf,
    pub source_dir: Option<PathBuf>,
    pub payload_path: Option<PathBuf>,
    pub kustomize_file: Option<PathBuf>,
    pub build_context_dir: PathBuf,
    pub project: String,
    pub domain: String,
    pub version: Option<String>,
    pub insecure: bool,
    pub compose_project: String,
    pub compose_command: String,
    pub setup_command: String,
    pub cleanup_command: String,
    pub flytectl_command: String,
    pub readiness_timeout: Duration,
    pub readiness_pause: Duration,
    pub keep_services: bool,
}

impl SessionConfig {
    /// Create a new builder
    pub fn builder() -> crate::config::builder::SessionConfigBuilder {
        crate::config::builder::SessionConfigBuilder::new()
    }

    /// Per-session cache directory for rendered artifacts
    pub fn cache_dir(&self) -> PathBuf {
        self.root_dir.join(CACHE_DIR_NAME)
    }

    /// Directory mounted into the sandbox as the workflow source
    pub fn workflows_source_dir(&self) -> PathBuf {
        self.source_dir.clone().unwrap_or_else(|| self.root_dir.clone())
    }

    /// How workloads get registered for this session
    pub fn workload_source(&self) -> WorkloadSource {
        match (&self.payload_path, &self.source_dir) {
            (Some(payload), Some(source_dir)) => WorkloadSource::Payload {
                payload: payload.clone(),
                source_dir: source_dir.clone(),
            },
            _ => WorkloadSource::SourceBuild,
        }
    }

    /// Project, domain and version tag registrations are published under
    pub fn registration(&self) -> Registration {
        Registration {
            project: self.project.clone(),
            domain: self.domain.clone(),
            version: self
                .version
                .clone()
                .unwrap_or_else(|| format!("v{}", std::process::id())),
        }
    }
}
