//! Test helpers and builder patterns for harness tests
//!
//! This module provides a scripted compose mock and session constructors that
//! keep every test inside its own temporary root directory.

use std::path::Path;

use mockall::Sequence;

use flyte_harness::*;

use super::fixtures::TestFixtures;

/// Scripted compose runner: expectations are matched in the order added
pub struct ComposeScript {
    mock: MockComposeRunner,
    seq: Sequence,
}

impl ComposeScript {
    pub fn new() -> Self {
        Self {
            mock: MockComposeRunner::new(),
            seq: Sequence::new(),
        }
    }

    /// Expect `subcommand` once and answer with `output`
    pub fn expect(mut self, subcommand: &'static str, output: Vec<u8>) -> Self {
        self.mock
            .expect_execute()
            .withf(move |sub| sub == subcommand)
            .times(1)
            .in_sequence(&mut self.seq)
            .returning(move |_| Ok(output.clone()));
        self
    }

    /// Expect `subcommand` `times` times, failing every time
    pub fn expect_failure(mut self, subcommand: &'static str, times: usize) -> Self {
        self.mock
            .expect_execute()
            .withf(move |sub| sub == subcommand)
            .times(times)
            .in_sequence(&mut self.seq)
            .returning(move |_| Err(TestFixtures::subprocess_error(subcommand)));
        self
    }

    /// Expect `subcommand` at least once, always failing. Not part of the sequence.
    pub fn expect_repeated_failure(mut self, subcommand: &'static str) -> Self {
        self.mock
            .expect_execute()
            .withf(move |sub| sub == subcommand)
            .times(1..)
            .returning(move |_| Err(TestFixtures::subprocess_error(subcommand)));
        self
    }

    /// Setup, port lookup and a readiness probe that succeeds at once
    pub fn healthy_start(self, port: u16) -> Self {
        self.expect(TestFixtures::SETUP, Vec::new())
            .expect(TestFixtures::PORT_QUERY, TestFixtures::port_output(port))
            .expect(TestFixtures::READINESS, b"flyte is ready\n".to_vec())
    }

    pub fn build(self) -> MockComposeRunner {
        self.mock
    }
}

impl Default for ComposeScript {
    fn default() -> Self {
        Self::new()
    }
}

pub struct TestHelpers;

impl TestHelpers {
    /// Local-mode builder rooted at `root` with a short readiness budget
    pub fn local_config(root: &Path) -> SessionConfigBuilder {
        SessionConfig::builder()
            .local(true)
            .root_dir(root)
            .readiness(TestFixtures::READINESS_TIMEOUT, TestFixtures::READINESS_PAUSE)
    }

    /// Remote-mode builder rooted at `root`
    pub fn remote_config(root: &Path) -> SessionConfigBuilder {
        SessionConfig::builder()
            .platform_url(TestFixtures::REMOTE_URL)
            .root_dir(root)
    }

    /// Session wired with the real renderer and prober and a scripted compose mock
    pub fn lifecycle(config: SessionConfig, compose: MockComposeRunner) -> SessionLifecycle<MockComposeRunner> {
        let renderer = ConfigRenderer::new(config.cache_dir()).expect("templates compile");
        let prober = ReadinessProber::new(config.readiness_timeout, config.readiness_pause);
        SessionLifecycle::new(config, renderer, compose, prober)
    }

    /// Published ports resolve against the local engine
    pub fn clear_docker_host() {
        unsafe {
            std::env::remove_var("DOCKER_HOST");
        }
    }
}
