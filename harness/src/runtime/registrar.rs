//! Workload registration
//!
//! Publishes workflows to a running platform, either from a pre-serialized
//! payload through `flytectl` or by building from source inside the sandbox.

use std::path::PathBuf;
use std::sync::Arc;

use shared::{Component, ServiceEndpoint, component_info};

use crate::error::{HarnessError, HarnessResult};
use crate::runtime::capture::GlobalCapture;
use crate::runtime::process::{CommandSpec, DEFAULT_SUCCESS_CODES, run_captured};
use crate::traits::{ComposeRunner, OutputCapture};

/// Registration CLI looked up on `PATH`
pub const DEFAULT_FLYTECTL_COMMAND: &str = "flytectl";
/// Workflow sources are mounted here inside the backend container
pub const CONTAINER_SOURCE_DIR: &str = "/flyteorg/src";

/// Where the workloads to register come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkloadSource {
    /// Pre-serialized archive registered from `source_dir`
    Payload { payload: PathBuf, source_dir: PathBuf },
    /// `make register` inside the backend container
    SourceBuild,
}

/// Target coordinates of a registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub project: String,
    pub domain: String,
    pub version: String,
}

pub struct WorkloadRegistrar {
    flytectl_command: String,
    insecure: bool,
    capture: Arc<dyn OutputCapture>,
}

impl WorkloadRegistrar {
    pub fn new(flytectl_command: impl Into<String>, insecure: bool) -> Self {
        Self {
            flytectl_command: flytectl_command.into(),
            insecure,
            capture: Arc::new(GlobalCapture),
        }
    }

    /// Configure the capture switch suspended while flytectl runs (fluent API)
    pub fn with_capture(mut self, capture: Arc<dyn OutputCapture>) -> Self {
        self.capture = capture;
        self
    }

    /// Build the flytectl invocation for payload mode
    pub fn payload_command(
        &self,
        payload: &std::path::Path,
        source_dir: &std::path::Path,
        endpoint: &ServiceEndpoint,
        registration: &Registration,
    ) -> HarnessResult<CommandSpec> {
        let mut spec = CommandSpec::from_command_line(&self.flytectl_command)?
            .args(["register", "files"])
            .arg(payload.display().to_string())
            .args([
                "--archive",
                "--project",
                registration.project.as_str(),
                "--domain",
                registration.domain.as_str(),
                "--version",
                registration.version.as_str(),
                "--admin.endpoint",
            ])
            .arg(format!("dns:///{}", endpoint.address()))
            .current_dir(source_dir);
        if self.insecure {
            spec = spec.arg("--admin.insecure");
        }
        Ok(spec)
    }

    /// Register workloads; `compose` is required for source-build mode
    pub async fn register<R>(
        &self,
        source: &WorkloadSource,
        endpoint: &ServiceEndpoint,
        registration: &Registration,
        compose: Option<&R>,
    ) -> HarnessResult<Vec<u8>>
    where
        R: ComposeRunner + ?Sized,
    {
        component_info!(
            Component::Registrar,
            "📦 Registering {}/{} version {} at {}",
            registration.project,
            registration.domain,
            registration.version,
            endpoint
        );

        let output = match source {
            WorkloadSource::Payload { payload, source_dir } => {
                let spec = self.payload_command(payload, source_dir, endpoint, registration)?;
                run_captured(&spec, DEFAULT_SUCCESS_CODES, self.capture.as_ref(), Component::Registrar)
                    .await?
            }
            WorkloadSource::SourceBuild => {
                let compose = compose.ok_or_else(|| {
                    HarnessError::config(
                        "source_dir",
                        "source-build registration needs the local sandbox; pass a payload in remote mode",
                    )
                })?;
                compose.execute(&source_build_subcommand(registration)).await?
            }
        };

        component_info!(Component::Registrar, "✅ Registration finished");
        Ok(output)
    }
}

/// Compose subcommand running `make register` in the backend container
pub fn source_build_subcommand(registration: &Registration) -> String {
    format!(
        "exec -T -e FLYTE_PROJECT={} -e FLYTE_DOMAIN={} -e FLYTE_VERSION={} -w {} backend make register",
        registration.project, registration.domain, registration.version, CONTAINER_SOURCE_DIR
    )
}
