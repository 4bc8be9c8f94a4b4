//! Readiness polling
//!
//! Polls a [`ReadinessCheck`] at a fixed pause until it reports ready or the
//! wall-clock budget runs out. Errors from the check count as "not ready".

use std::time::{Duration, Instant};

use tokio::time::sleep;

use shared::{Component, component_debug, component_info, component_warn};

use crate::error::{HarnessError, HarnessResult};
use crate::traits::ReadinessCheck;

pub struct ReadinessProber {
    timeout: Duration,
    pause: Duration,
}

impl ReadinessProber {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(900);
    pub const DEFAULT_PAUSE: Duration = Duration::from_secs(1);

    pub fn new(timeout: Duration, pause: Duration) -> Self {
        Self { timeout, pause }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn pause(&self) -> Duration {
        self.pause
    }

    /// Poll until ready, returning the number of attempts it took
    pub async fn wait_until_ready<C>(&self, check: &C) -> HarnessResult<u32>
    where
        C: ReadinessCheck + ?Sized,
    {
        wait_until_ready(check, self.timeout, self.pause).await
    }
}

impl Default for ReadinessProber {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TIMEOUT, Self::DEFAULT_PAUSE)
    }
}

/// Poll `check` every `pause` until it returns `true` or `timeout` elapses.
///
/// The check may carry its own, independent timeout; no deadline is imposed on
/// a single attempt beyond the outer budget.
pub async fn wait_until_ready<C>(check: &C, timeout: Duration, pause: Duration) -> HarnessResult<u32>
where
    C: ReadinessCheck + ?Sized,
{
    let service = check.describe();
    let start = Instant::now();
    let mut attempts = 0;

    component_info!(Component::Prober, "⏳ Waiting for '{}' to become ready (max: {:?})", service, timeout);

    while start.elapsed() < timeout {
        attempts += 1;
        match check.check().await {
            Ok(true) => {
                component_info!(
                    Component::Prober,
                    "✅ '{}' ready after {} attempt(s) in {:?}",
                    service,
                    attempts,
                    start.elapsed()
                );
                return Ok(attempts);
            }
            Ok(false) => {
                component_debug!(Component::Prober, "'{}' not ready yet (attempt {})", service, attempts);
            }
            Err(e) => {
                component_warn!(Component::Prober, "⚠️ Probe of '{}' failed (attempt {}): {}", service, attempts, e);
            }
        }
        sleep(pause).await;
    }

    Err(HarnessError::ReadinessTimeout {
        service,
        timeout,
        attempts,
    })
}
