//! Runtime Management
//!
//! This module handles the child processes, containers and network client a
//! harness session drives.

pub mod capture;
pub mod client;
pub mod compose;
pub mod lifecycle;
pub mod process;
pub mod prober;
pub mod registrar;

#[cfg(test)]
mod tests;

// Re-export main types
pub use capture::{CaptureGuard, GlobalCapture, with_capture_suspended};
pub use client::{FlyteClient, Project};
pub use compose::{ComposeExecCheck, ComposeExecutor, docker_ip, resolve_port};
pub use lifecycle::{SessionLifecycle, SessionState};
pub use process::{CommandSpec, run_captured};
pub use prober::{ReadinessProber, wait_until_ready};
pub use registrar::{Registration, WorkloadRegistrar, WorkloadSource};
