//! Flyte Sandbox Test Harness
//!
//! Brings up a disposable Flyte sandbox through a container-compose stack (or
//! attaches to an already running platform), waits for it to become ready and
//! hands out an admin client for integration tests.
//!
//! ## Main Interface
//!
//! The primary interface is [`SessionLifecycle`], driven by an immutable
//! [`SessionConfig`] built through [`SessionConfigBuilder`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use flyte_harness::*;
//!
//! # async fn run() -> HarnessResult<()> {
//! let config = SessionConfig::builder()
//!     .local(true)
//!     .root_dir(".")
//!     .build()?;
//!
//! let mut session = SessionLifecycle::from_config(config)?;
//! let projects = session.start().await?.list_projects(5).await?;
//! println!("{} projects registered", projects.len());
//!
//! session.teardown().await?;
//! # Ok(())
//! # }
//! ```

// Core modules
pub mod config;
pub mod error;
pub mod render;
pub mod runtime;
pub mod traits;

// Main interfaces - re-exported at crate root for convenience
pub use config::{SessionConfig, SessionConfigBuilder};
pub use error::{HarnessError, HarnessResult};
pub use runtime::{FlyteClient, SessionLifecycle, SessionState};

// Supporting types
pub use render::{ConfigRenderer, RenderedArtifact};
pub use runtime::{
    CaptureGuard, ComposeExecutor, GlobalCapture, Project, ReadinessProber, Registration, WorkloadRegistrar,
    WorkloadSource,
};
pub use traits::{ComposeRunner, OutputCapture, ReadinessCheck};

// Re-export mocks for integration tests
pub use traits::{MockComposeRunner, MockOutputCapture, MockReadinessCheck};
