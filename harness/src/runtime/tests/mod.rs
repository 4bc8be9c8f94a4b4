//! Runtime component tests
//!
//! Each component has its own test file; shared helpers live below.


// Common test utilities for runtime components
#[cfg(test)]
pub mod common {
    use std::time::Duration;

    use crate::traits::MockOutputCapture;

    /// Pause used by prober tests; short enough to keep the suite fast
    pub const TEST_PAUSE: Duration = Duration::from_millis(20);

    /// Capture mock that accepts any number of suspend/resume pairs
    pub fn permissive_capture() -> MockOutputCapture {
        let mut capture = MockOutputCapture::new();
        capture.expect_suspend().times(0..).return_const(());
        capture.expect_resume().times(0..).return_const(());
        capture.expect_is_suspended().times(0..).return_const(false);
        capture
    }
}
