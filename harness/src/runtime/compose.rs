//! Container-compose executor
//!
//! Wraps the compose CLI for one project and one ordered set of compose files.
//! Commands are built as `<tool> -f <file>... -p <project> <subcommand>`.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use shared::{Component, component_debug, component_info};

use crate::error::{HarnessError, HarnessResult};
use crate::runtime::capture::GlobalCapture;
use crate::runtime::process::{CommandSpec, DEFAULT_SUCCESS_CODES, run_captured};
use crate::traits::{ComposeRunner, OutputCapture, ReadinessCheck};

/// Default compose tool invocation
pub const DEFAULT_COMPOSE_COMMAND: &str = "docker compose";
/// Default compose project name
pub const DEFAULT_PROJECT_NAME: &str = "flyte-harness";
/// Subcommand used to bring the stack up
pub const DEFAULT_SETUP_COMMAND: &str = "up --build -d";
/// Subcommand used to tear the stack down
pub const DEFAULT_CLEANUP_COMMAND: &str = "down -v";

/// Real compose executor backed by a child process
pub struct ComposeExecutor {
    command: String,
    compose_files: Vec<PathBuf>,
    project_name: String,
    success_codes: Vec<i32>,
    capture: Arc<dyn OutputCapture>,
}

impl ComposeExecutor {
    /// Create an executor for the given compose files and project
    pub fn new(compose_files: Vec<PathBuf>, project_name: impl Into<String>) -> Self {
        Self {
            command: DEFAULT_COMPOSE_COMMAND.to_string(),
            compose_files,
            project_name: project_name.into(),
            success_codes: DEFAULT_SUCCESS_CODES.to_vec(),
            capture: Arc::new(GlobalCapture),
        }
    }

    /// Override the compose tool, e.g. `docker-compose` or `podman compose` (fluent API)
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }

    /// Configure the exit codes treated as success (fluent API)
    pub fn with_success_codes(mut self, codes: Vec<i32>) -> Self {
        self.success_codes = codes;
        self
    }

    /// Configure the capture switch suspended while commands run (fluent API)
    pub fn with_capture(mut self, capture: Arc<dyn OutputCapture>) -> Self {
        self.capture = capture;
        self
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    pub fn compose_files(&self) -> &[PathBuf] {
        &self.compose_files
    }

    /// Build the full command for a subcommand without running it
    pub fn command_spec(&self, subcommand: &str) -> HarnessResult<CommandSpec> {
        let mut spec = CommandSpec::from_command_line(&self.command)?;
        for file in &self.compose_files {
            spec = spec.arg("-f").arg(file.display().to_string());
        }
        Ok(spec
            .arg("-p")
            .arg(self.project_name.as_str())
            .args(subcommand.split_whitespace()))
    }
}

#[async_trait]
impl ComposeRunner for ComposeExecutor {
    async fn execute(&self, subcommand: &str) -> HarnessResult<Vec<u8>> {
        let spec = self.command_spec(subcommand)?;
        run_captured(&spec, &self.success_codes, self.capture.as_ref(), Component::Compose).await
    }
}

/// Resolve the host port published for `service:private_port`.
///
/// Runs `port <service> <private_port>` and reads the port from the last
/// non-empty line, e.g. `0.0.0.0:49153`.
pub async fn resolve_port<R>(runner: &R, service: &str, private_port: u16) -> HarnessResult<u16>
where
    R: ComposeRunner + ?Sized,
{
    let output = runner.execute(&format!("port {service} {private_port}")).await?;
    let text = String::from_utf8_lossy(&output);

    let port = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .last()
        .and_then(|line| line.rsplit(':').next())
        .and_then(|port| port.parse::<u16>().ok())
        .ok_or_else(|| HarnessError::PortResolution {
            service: service.to_string(),
            private_port,
            output: text.to_string(),
        })?;

    component_debug!(Component::Compose, "🔌 {}:{} is published on {}", service, private_port, port);
    Ok(port)
}

/// Host on which published container ports are reachable
pub fn docker_ip() -> String {
    docker_ip_from(std::env::var("DOCKER_HOST").ok().as_deref())
}

/// `DOCKER_HOST=tcp://<host>:<port>` points at a remote engine; anything else is local
pub fn docker_ip_from(docker_host: Option<&str>) -> String {
    docker_host
        .filter(|host| host.starts_with("tcp://"))
        .and_then(|host| Url::parse(host).ok())
        .and_then(|url| url.host_str().map(str::to_string))
        .unwrap_or_else(|| "127.0.0.1".to_string())
}

/// Readiness check that execs a probe command inside a composed service
pub struct ComposeExecCheck<'a, R: ComposeRunner + ?Sized> {
    runner: &'a R,
    service: String,
    command: String,
}

impl<'a, R: ComposeRunner + ?Sized> ComposeExecCheck<'a, R> {
    pub fn new(runner: &'a R, service: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            runner,
            service: service.into(),
            command: command.into(),
        }
    }

    pub fn subcommand(&self) -> String {
        format!("exec -T {} {}", self.service, self.command)
    }
}

#[async_trait]
impl<R: ComposeRunner + ?Sized> ReadinessCheck for ComposeExecCheck<'_, R> {
    fn describe(&self) -> String {
        self.service.clone()
    }

    async fn check(&self) -> HarnessResult<bool> {
        self.runner.execute(&self.subcommand()).await?;
        component_info!(Component::Compose, "💚 '{}' succeeded in {}", self.command, self.service);
        Ok(true)
    }
}
