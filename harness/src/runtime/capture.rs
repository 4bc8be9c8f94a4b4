//! Output capture suspension
//!
//! The capture switch is process-wide and not re-entrant across concurrent
//! sessions. Callers never toggle it directly; they hold a [`CaptureGuard`]
//! for the duration of the call that must be visible to the operator.

use std::sync::atomic::{AtomicBool, Ordering};

use shared::{Component, component_debug};

use crate::traits::OutputCapture;

static SUSPENDED: AtomicBool = AtomicBool::new(false);

/// Process-wide capture switch
#[derive(Debug, Default, Clone, Copy)]
pub struct GlobalCapture;

impl OutputCapture for GlobalCapture {
    fn suspend(&self) {
        SUSPENDED.store(true, Ordering::SeqCst);
        component_debug!(Component::Compose, "🔈 Output capture suspended");
    }

    fn resume(&self) {
        SUSPENDED.store(false, Ordering::SeqCst);
        component_debug!(Component::Compose, "🔇 Output capture resumed");
    }

    fn is_suspended(&self) -> bool {
        SUSPENDED.load(Ordering::SeqCst)
    }
}

/// Scoped suspension: suspends on creation, resumes on drop.
///
/// Dropping happens on every exit path, including `?` returns and panics.
#[must_use = "capture is resumed as soon as the guard is dropped"]
pub struct CaptureGuard<'a> {
    capture: &'a dyn OutputCapture,
}

impl<'a> CaptureGuard<'a> {
    pub fn suspend(capture: &'a dyn OutputCapture) -> Self {
        capture.suspend();
        Self { capture }
    }
}

impl Drop for CaptureGuard<'_> {
    fn drop(&mut self) {
        self.capture.resume();
    }
}

/// Run `f` with capture suspended
pub fn with_capture_suspended<T>(capture: &dyn OutputCapture, f: impl FnOnce() -> T) -> T {
    let _guard = CaptureGuard::suspend(capture);
    f()
}
