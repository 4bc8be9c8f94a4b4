//! Test fixtures and data for harness tests
//!
//! Compose subcommands the session is expected to issue, and canned outputs.

use std::time::Duration;

/// Standard test data and fixtures
pub struct TestFixtures;

impl TestFixtures {
    /// Compose subcommands issued by a local session
    pub const SETUP: &'static str = "up --build -d";
    pub const CLEANUP: &'static str = "down -v";
    pub const PORT_QUERY: &'static str = "port backend 30081";
    pub const READINESS: &'static str = "exec -T backend wait-for-flyte.sh";

    /// Remote platform address used by remote-mode tests
    pub const REMOTE_URL: &'static str = "http://10.0.0.5:30081";
    pub const REMOTE_ADDRESS: &'static str = "10.0.0.5:30081";

    /// Published port reported when no real server is needed
    pub const PUBLISHED_PORT: u16 = 49153;

    /// Readiness budget that keeps failing tests short
    pub const READINESS_TIMEOUT: Duration = Duration::from_millis(200);
    pub const READINESS_PAUSE: Duration = Duration::from_millis(20);

    /// Output of `port backend 30081` as the compose tool prints it
    pub fn port_output(port: u16) -> Vec<u8> {
        format!("0.0.0.0:{port}\n").into_bytes()
    }

    /// Error a failing compose subcommand reports
    pub fn subprocess_error(subcommand: &str) -> flyte_harness::HarnessError {
        flyte_harness::HarnessError::Subprocess {
            command: format!("docker compose -p flyte-harness {subcommand}"),
            exit_code: Some(1),
            output: "service \"backend\" is not running\n".to_string(),
        }
    }
}
