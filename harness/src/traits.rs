//! Trait definitions with mockall annotations for testing
//!
//! These are the seams the session lifecycle is built on. Real implementations
//! live in `runtime`; the generated mocks let the lifecycle, prober and
//! registrar be exercised without a container engine.

use async_trait::async_trait;

use crate::error::HarnessResult;

/// Container-compose abstraction
///
/// A runner is bound to one compose project and one ordered set of compose
/// files for its whole life. Only the subcommand varies per call.
#[mockall::automock]
#[async_trait]
pub trait ComposeRunner: Send + Sync {
    /// Run `subcommand` against the composed project
    ///
    /// # Returns
    /// Combined stdout/stderr of the command, or a `Subprocess` error when the
    /// exit code is outside the success set
    async fn execute(&self, subcommand: &str) -> HarnessResult<Vec<u8>>;
}

/// Readiness probe abstraction
#[mockall::automock]
#[async_trait]
pub trait ReadinessCheck: Send + Sync {
    /// Human readable name of what is being probed, used in timeout errors
    fn describe(&self) -> String;

    /// Probe once. `Ok(false)` and `Err(_)` both mean "not ready yet".
    async fn check(&self) -> HarnessResult<bool>;
}

/// Test-output capture switch
///
/// While suspended, subprocess output is written straight to the operator's
/// terminal instead of being buffered by the test runner.
#[mockall::automock]
pub trait OutputCapture: Send + Sync {
    fn suspend(&self);
    fn resume(&self);
    fn is_suspended(&self) -> bool;
}
