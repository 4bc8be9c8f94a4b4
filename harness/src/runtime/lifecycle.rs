//! Session lifecycle
//!
//! One session owns the cache directory, the compose project and the admin
//! client. It moves through the states below exactly once; any fatal error in
//! `start` moves it to `Aborted`, after which only `teardown` is meaningful.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use shared::{Component, RunMode, ServiceEndpoint, component_debug, component_error, component_info, component_warn};

use crate::config::SessionConfig;
use crate::config::session::{ADMIN_PORT, BACKEND_SERVICE, READINESS_COMMAND};
use crate::error::{HarnessError, HarnessResult};
use crate::render::{ComposeParams, ConfigRenderer, KustomizationParams, RenderedArtifact};
use crate::runtime::capture::GlobalCapture;
use crate::runtime::client::{FlyteClient, PLATFORM_INSECURE_ENV, PLATFORM_URL_ENV};
use crate::runtime::compose::{ComposeExecCheck, ComposeExecutor, docker_ip, resolve_port};
use crate::runtime::prober::ReadinessProber;
use crate::runtime::registrar::WorkloadRegistrar;
use crate::traits::ComposeRunner;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    ConfigRendered,
    ComposeStarted,
    EndpointResolved,
    Ready,
    ClientBuilt,
    TornDown,
    Aborted,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Uninitialized => "uninitialized",
            SessionState::ConfigRendered => "config-rendered",
            SessionState::ComposeStarted => "compose-started",
            SessionState::EndpointResolved => "endpoint-resolved",
            SessionState::Ready => "ready",
            SessionState::ClientBuilt => "client-built",
            SessionState::TornDown => "torn-down",
            SessionState::Aborted => "aborted",
        };
        write!(f, "{name}")
    }
}

/// Drives one harness session from configuration to teardown
pub struct SessionLifecycle<R: ComposeRunner> {
    config: SessionConfig,
    renderer: ConfigRenderer,
    compose: R,
    prober: ReadinessProber,
    state: SessionState,
    endpoint: Option<ServiceEndpoint>,
    client: Option<FlyteClient>,
    artifacts: Vec<RenderedArtifact>,
    compose_started: bool,
    cache_created: bool,
}

impl SessionLifecycle<ComposeExecutor> {
    /// Wire the real renderer, compose executor and prober from `config`
    pub fn from_config(config: SessionConfig) -> HarnessResult<Self> {
        let renderer = ConfigRenderer::new(config.cache_dir())?;
        let compose = ComposeExecutor::new(vec![renderer.compose_file_path()], config.compose_project.clone())
            .with_command(config.compose_command.clone())
            .with_capture(Arc::new(GlobalCapture));
        let prober = ReadinessProber::new(config.readiness_timeout, config.readiness_pause);

        Ok(Self::new(config, renderer, compose, prober))
    }
}

impl<R: ComposeRunner> SessionLifecycle<R> {
    pub fn new(config: SessionConfig, renderer: ConfigRenderer, compose: R, prober: ReadinessProber) -> Self {
        Self {
            config,
            renderer,
            compose,
            prober,
            state: SessionState::Uninitialized,
            endpoint: None,
            client: None,
            artifacts: Vec::new(),
            compose_started: false,
            cache_created: false,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn endpoint(&self) -> Option<&ServiceEndpoint> {
        self.endpoint.as_ref()
    }

    pub fn client(&self) -> Option<&FlyteClient> {
        self.client.as_ref()
    }

    /// Artifacts rendered into the cache directory, in render order
    pub fn artifacts(&self) -> &[RenderedArtifact] {
        &self.artifacts
    }

    pub fn compose(&self) -> &R {
        &self.compose
    }

    /// Bring the platform up (or attach to it) and build the client.
    ///
    /// On failure the session is `Aborted`; call [`teardown`](Self::teardown)
    /// to release whatever was started.
    pub async fn start(&mut self) -> HarnessResult<&FlyteClient> {
        self.expect_state(SessionState::Uninitialized)?;
        component_info!(Component::Lifecycle, "🚀 Starting session ({})", self.config.mode);

        if let Err(e) = self.advance().await {
            component_error!(Component::Lifecycle, "❌ Session aborted in state {}: {}", self.state, e);
            self.state = SessionState::Aborted;
            return Err(e);
        }

        self.client.as_ref().ok_or_else(|| HarnessError::InvalidState {
            expected: SessionState::ClientBuilt.to_string(),
            actual: self.state.to_string(),
        })
    }

    async fn advance(&mut self) -> HarnessResult<()> {
        match self.config.mode.clone() {
            RunMode::Local => {
                self.render_configuration()?;
                self.start_services().await?;
                self.resolve_endpoint().await?;
                self.wait_until_ready().await?;
            }
            RunMode::Remote { endpoint } => {
                component_info!(Component::Lifecycle, "🌐 Using remote platform at {}", endpoint);
                // Nothing to render, start or probe
                self.endpoint = Some(endpoint);
                self.state = SessionState::Ready;
            }
        }
        self.build_client()
    }

    fn render_configuration(&mut self) -> HarnessResult<()> {
        let cache_dir = self.config.cache_dir();
        std::fs::create_dir_all(&cache_dir)?;
        self.cache_created = true;

        let kustomization_path = match &self.config.kustomize_file {
            Some(path) => {
                component_info!(Component::Lifecycle, "📎 Using kustomization override {}", path.display());
                absolute(path)?
            }
            None => {
                let artifact = self.renderer.render_kustomization(&KustomizationParams::default())?;
                let path = artifact.path.clone();
                self.artifacts.push(artifact);
                absolute(&path)?
            }
        };

        let params = ComposeParams {
            build_context_dir: absolute(&self.config.build_context_dir)?.display().to_string(),
            flyte_workflows_source_dir: absolute(&self.config.workflows_source_dir())?.display().to_string(),
            kustomization_file_path: kustomization_path.display().to_string(),
            compose_service: BACKEND_SERVICE.to_string(),
            admin_port: ADMIN_PORT,
        };
        let artifact = self.renderer.render_compose(&params)?;
        self.artifacts.push(artifact);

        self.state = SessionState::ConfigRendered;
        Ok(())
    }

    async fn start_services(&mut self) -> HarnessResult<()> {
        // Set before running so a half-started stack is still cleaned up
        self.compose_started = true;
        self.compose.execute(&self.config.setup_command).await?;
        self.state = SessionState::ComposeStarted;
        Ok(())
    }

    async fn resolve_endpoint(&mut self) -> HarnessResult<()> {
        let port = resolve_port(&self.compose, BACKEND_SERVICE, ADMIN_PORT).await?;
        let endpoint = ServiceEndpoint::new(docker_ip(), port);
        component_info!(Component::Lifecycle, "🔌 Admin service published at {}", endpoint);

        self.endpoint = Some(endpoint);
        self.state = SessionState::EndpointResolved;
        Ok(())
    }

    async fn wait_until_ready(&mut self) -> HarnessResult<()> {
        let check = ComposeExecCheck::new(&self.compose, BACKEND_SERVICE, READINESS_COMMAND);
        self.prober.wait_until_ready(&check).await?;
        self.state = SessionState::Ready;
        Ok(())
    }

    fn build_client(&mut self) -> HarnessResult<()> {
        let endpoint = self.endpoint.as_ref().ok_or(HarnessError::InvalidState {
            expected: SessionState::EndpointResolved.to_string(),
            actual: self.state.to_string(),
        })?;

        // SAFETY: the session flow is sequential and nothing else reads these variables concurrently
        unsafe {
            std::env::set_var(PLATFORM_URL_ENV, endpoint.address());
            std::env::set_var(PLATFORM_INSECURE_ENV, if self.config.insecure { "true" } else { "false" });
        }

        self.client = Some(FlyteClient::from_env()?);
        self.state = SessionState::ClientBuilt;
        component_info!(Component::Lifecycle, "✅ Client ready for {}", endpoint);
        Ok(())
    }

    /// Register workloads against the ready platform
    pub async fn register_workloads(&self) -> HarnessResult<Vec<u8>> {
        self.expect_state(SessionState::ClientBuilt)?;
        let endpoint = self.endpoint.as_ref().ok_or(HarnessError::InvalidState {
            expected: SessionState::EndpointResolved.to_string(),
            actual: self.state.to_string(),
        })?;

        let registrar = WorkloadRegistrar::new(self.config.flytectl_command.clone(), self.config.insecure);
        let compose = self.config.mode.is_local().then_some(&self.compose);
        registrar
            .register(&self.config.workload_source(), endpoint, &self.config.registration(), compose)
            .await
    }

    /// Release everything the session started. Idempotent.
    ///
    /// Every step is attempted; the first error is returned.
    pub async fn teardown(&mut self) -> HarnessResult<()> {
        if self.state == SessionState::TornDown {
            return Ok(());
        }
        component_info!(Component::Lifecycle, "🛑 Tearing down session (state: {})", self.state);

        let mut first_error = None;

        if self.compose_started {
            if self.config.keep_services {
                component_info!(Component::Lifecycle, "🔄 Keeping services running (keep_services set)");
            } else if let Err(e) = self.compose.execute(&self.config.cleanup_command).await {
                component_warn!(Component::Lifecycle, "⚠️ Cleanup command failed: {}", e);
                first_error = first_error.or(Some(e));
            }
            self.compose_started = false;
        }

        // Only the session that created the cache directory removes it
        if self.cache_created {
            if let Err(e) = remove_cache_dir(&self.config.cache_dir()) {
                component_warn!(Component::Lifecycle, "⚠️ Failed to remove cache directory: {}", e);
                first_error = first_error.or(Some(e.into()));
            }
            self.cache_created = false;
        }

        self.client = None;
        self.state = SessionState::TornDown;
        component_info!(Component::Lifecycle, "🏁 Session torn down");

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn expect_state(&self, expected: SessionState) -> HarnessResult<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(HarnessError::InvalidState {
                expected: expected.to_string(),
                actual: self.state.to_string(),
            })
        }
    }
}

impl<R: ComposeRunner> Drop for SessionLifecycle<R> {
    fn drop(&mut self) {
        if self.state == SessionState::TornDown {
            return;
        }

        // No runtime to run the cleanup command on; release the cache and say so
        if self.compose_started && !self.config.keep_services {
            component_warn!(
                Component::Lifecycle,
                "⚠️ Session dropped without teardown; compose project '{}' may still be running",
                self.config.compose_project
            );
        }
        if self.cache_created {
            if let Err(e) = remove_cache_dir(&self.config.cache_dir()) {
                component_debug!(Component::Lifecycle, "Cache removal on drop failed: {}", e);
            }
        }
    }
}

fn remove_cache_dir(dir: &std::path::Path) -> std::io::Result<()> {
    match std::fs::remove_dir_all(dir) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

/// Compose resolves relative volume paths against the compose file's directory
fn absolute(path: &std::path::Path) -> HarnessResult<PathBuf> {
    Ok(std::path::absolute(path)?)
}
