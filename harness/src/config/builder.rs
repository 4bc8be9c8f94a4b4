//! Session Configuration Builder
//!
//! Collects raw options (from the CLI, `.env` or test code) and validates them
//! once into an immutable [`SessionConfig`].

use std::path::PathBuf;
use std::time::Duration;

use shared::{RunMode, ServiceEndpoint};

use super::SessionConfig;
use super::session::{DEFAULT_DOMAIN, DEFAULT_PROJECT};
use crate::error::{HarnessError, HarnessResult};
use crate::runtime::compose::{
    DEFAULT_CLEANUP_COMMAND, DEFAULT_COMPOSE_COMMAND, DEFAULT_PROJECT_NAME, DEFAULT_SETUP_COMMAND,
};
use crate::runtime::prober::ReadinessProber;
use crate::runtime::registrar::DEFAULT_FLYTECTL_COMMAND;

pub struct SessionConfigBuilder {
    local: Option<bool>,
    platform_url: Option<String>,
    root_dir: PathBuf,
    source_dir: Option<PathBuf>,
    payload_path: Option<PathBuf>,
    kustomize_file: Option<PathBuf>,
    build_context_dir: PathBuf,
    project: String,
    domain: String,
    version: Option<String>,
    insecure: bool,
    compose_project: String,
    compose_command: String,
    setup_command: String,
    cleanup_command: String,
    flytectl_command: String,
    readiness_timeout: Duration,
    readiness_pause: Duration,
    keep_services: bool,
}

impl SessionConfigBuilder {
    pub fn new() -> Self {
        Self {
            local: None,
            platform_url: None,
            root_dir: PathBuf::from("."),
            source_dir: None,
            payload_path: None,
            kustomize_file: None,
            build_context_dir: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("docker"),
            project: DEFAULT_PROJECT.to_string(),
            domain: DEFAULT_DOMAIN.to_string(),
            version: None,
            insecure: true,
            compose_project: DEFAULT_PROJECT_NAME.to_string(),
            compose_command: DEFAULT_COMPOSE_COMMAND.to_string(),
            setup_command: DEFAULT_SETUP_COMMAND.to_string(),
            cleanup_command: DEFAULT_CLEANUP_COMMAND.to_string(),
            flytectl_command: DEFAULT_FLYTECTL_COMMAND.to_string(),
            readiness_timeout: ReadinessProber::DEFAULT_TIMEOUT,
            readiness_pause: ReadinessProber::DEFAULT_PAUSE,
            keep_services: false,
        }
    }

    /// Set the local flag explicitly
    pub fn local(mut self, local: bool) -> Self {
        self.local = Some(local);
        self
    }

    /// Target an already running platform
    pub fn platform_url<S: Into<String>>(mut self, url: S) -> Self {
        self.platform_url = Some(url.into());
        self
    }

    /// Root directory; the cache directory is created beneath it
    pub fn root_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.root_dir = dir.into();
        self
    }

    /// Workflow source directory (defaults to the root directory)
    pub fn source_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.source_dir = Some(dir.into());
        self
    }

    /// Pre-serialized registration payload
    pub fn payload_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.payload_path = Some(path.into());
        self
    }

    /// Use this kustomization file instead of rendering one
    pub fn kustomize_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.kustomize_file = Some(path.into());
        self
    }

    /// Docker build context of the sandbox image
    pub fn build_context_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.build_context_dir = dir.into();
        self
    }

    pub fn project<S: Into<String>>(mut self, project: S) -> Self {
        self.project = project.into();
        self
    }

    pub fn domain<S: Into<String>>(mut self, domain: S) -> Self {
        self.domain = domain.into();
        self
    }

    /// Version tag for registrations (defaults to `v<pid>`)
    pub fn version<S: Into<String>>(mut self, version: S) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    pub fn compose_project<S: Into<String>>(mut self, name: S) -> Self {
        self.compose_project = name.into();
        self
    }

    /// Compose tool invocation, e.g. `docker-compose`
    pub fn compose_command<S: Into<String>>(mut self, command: S) -> Self {
        self.compose_command = command.into();
        self
    }

    pub fn setup_command<S: Into<String>>(mut self, command: S) -> Self {
        self.setup_command = command.into();
        self
    }

    pub fn cleanup_command<S: Into<String>>(mut self, command: S) -> Self {
        self.cleanup_command = command.into();
        self
    }

    pub fn flytectl_command<S: Into<String>>(mut self, command: S) -> Self {
        self.flytectl_command = command.into();
        self
    }

    /// Set readiness budget and pause between probes
    pub fn readiness(mut self, timeout: Duration, pause: Duration) -> Self {
        self.readiness_timeout = timeout;
        self.readiness_pause = pause;
        self
    }

    /// Leave the composed services running at teardown
    pub fn keep_services(mut self, keep: bool) -> Self {
        self.keep_services = keep;
        self
    }

    /// Validate and build the configuration. Performs no I/O.
    pub fn build(self) -> HarnessResult<SessionConfig> {
        let mode = match (self.local, self.platform_url.as_deref()) {
            (Some(true), Some(_)) => {
                return Err(HarnessError::config(
                    "mode",
                    "local mode and a remote platform URL are mutually exclusive",
                ));
            }
            (Some(true), None) => RunMode::Local,
            (_, Some(url)) if url.trim().is_empty() => {
                return Err(HarnessError::config("flyte_platform_url", "remote mode requires a non-empty address"));
            }
            (_, Some(url)) => RunMode::Remote {
                endpoint: ServiceEndpoint::parse(url)?,
            },
            (Some(false) | None, None) => {
                return Err(HarnessError::config(
                    "mode",
                    "either local mode or a remote platform URL is required",
                ));
            }
        };

        if self.payload_path.is_some() && self.source_dir.is_none() {
            return Err(HarnessError::config(
                "source_dir",
                "payload registration requires both the payload path and the source path",
            ));
        }

        for (field, value) in [
            ("project", &self.project),
            ("domain", &self.domain),
            ("compose_project", &self.compose_project),
            ("compose_command", &self.compose_command),
        ] {
            if value.trim().is_empty() {
                return Err(HarnessError::config(field, "must not be empty"));
            }
        }

        Ok(SessionConfig {
            mode,
            root_dir: self.root_dir,
            source_dir: self.source_dir,
            payload_path: self.payload_path,
            kustomize_file: self.kustomize_file,
            build_context_dir: self.build_context_dir,
            project: self.project,
            domain: self.domain,
            version: self.version,
            insecure: self.insecure,
            compose_project: self.compose_project,
            compose_command: self.compose_command,
            setup_command: self.setup_command,
            cleanup_command: self.cleanup_command,
            flytectl_command: self.flytectl_command,
            readiness_timeout: self.readiness_timeout,
            readiness_pause: self.readiness_pause,
            keep_services: self.keep_services,
        })
    }
}

impl Default for SessionConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
