//! Session lifecycle integration tests
//!
//! Drive full sessions against a scripted compose runner: local start and
//! teardown, remote attach, early aborts and registration.

mod common;

use assert_matches::assert_matches;
use serde_json::json;
use serial_test::serial;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{ComposeScript, TestFixtures, TestHelpers};
use flyte_harness::runtime::client::{PLATFORM_INSECURE_ENV, PLATFORM_URL_ENV};
use flyte_harness::*;

/// Full local session: render, start, resolve, probe, client, teardown
#[tokio::test]
#[serial]
async fn test_local_session_end_to_end() {
    TestHelpers::clear_docker_host();
    let root = tempfile::tempdir().unwrap();

    // The published port points at a mock admin gateway
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "projects": [{ "id": "flytesnacks", "name": "flytesnacks" }]
        })))
        .mount(&server)
        .await;
    let port = server.address().port();

    let compose = ComposeScript::new()
        .healthy_start(port)
        .expect(TestFixtures::CLEANUP, Vec::new())
        .build();
    let config = TestHelpers::local_config(root.path()).build().unwrap();
    let cache_dir = config.cache_dir();
    let mut session = TestHelpers::lifecycle(config, compose);
    assert_eq!(session.state(), SessionState::Uninitialized);

    let client = session.start().await.unwrap();
    assert_eq!(client.endpoint().address(), format!("127.0.0.1:{port}"));
    assert!(client.is_insecure());
    let projects = client.list_projects(5).await.unwrap();
    assert_eq!(projects[0].id, "flytesnacks");

    assert_eq!(session.state(), SessionState::ClientBuilt);
    assert_eq!(std::env::var(PLATFORM_URL_ENV).unwrap(), format!("127.0.0.1:{port}"));
    assert_eq!(std::env::var(PLATFORM_INSECURE_ENV).unwrap(), "true");

    // Kustomization named by content hash, compose file by constant name
    let artifacts = session.artifacts();
    assert_eq!(artifacts.len(), 2);
    let kustomization = artifacts[0].path.file_name().unwrap().to_string_lossy().into_owned();
    assert_eq!(kustomization, format!("kustomization-{}.yaml", artifacts[0].checksum));
    assert_eq!(artifacts[1].path, cache_dir.join("docker-compose.yaml"));

    let compose_text = std::fs::read_to_string(&artifacts[1].path).unwrap();
    assert!(compose_text.contains(":/flyteorg/src"));
    assert!(compose_text.contains(&artifacts[0].path.display().to_string()));
    assert!(compose_text.contains("30081"));

    session.teardown().await.unwrap();
    assert_eq!(session.state(), SessionState::TornDown);
    assert!(!cache_dir.exists(), "cache directory must be removed");
    assert!(session.client().is_none());

    // Idempotent: the cleanup expectation is satisfied exactly once
    session.teardown().await.unwrap();
}

/// Remote mode never touches compose or the filesystem
#[tokio::test]
#[serial]
async fn test_remote_session_skips_compose() {
    let root = tempfile::tempdir().unwrap();
    let compose = ComposeScript::new().build();
    let config = TestHelpers::remote_config(root.path()).build().unwrap();
    let cache_dir = config.cache_dir();
    let mut session = TestHelpers::lifecycle(config, compose);

    let client = session.start().await.unwrap();
    assert_eq!(client.endpoint().address(), TestFixtures::REMOTE_ADDRESS);
    assert_eq!(std::env::var(PLATFORM_URL_ENV).unwrap(), TestFixtures::REMOTE_ADDRESS);
    assert!(!cache_dir.exists());
    assert!(session.artifacts().is_empty());

    session.teardown().await.unwrap();
    assert_eq!(session.state(), SessionState::TornDown);
}

/// Invalid mode combinations fail before anything is created
#[test]
fn test_configuration_error_has_no_side_effects() {
    let root = tempfile::tempdir().unwrap();

    let neither = SessionConfig::builder().root_dir(root.path()).build();
    assert_matches!(neither, Err(HarnessError::Configuration { .. }));

    let both = SessionConfig::builder()
        .root_dir(root.path())
        .local(true)
        .platform_url(TestFixtures::REMOTE_URL)
        .build();
    assert_matches!(both, Err(HarnessError::Configuration { .. }));

    assert!(!root.path().join(".flyte_harness").exists());
}

/// Readiness timeout aborts the session; teardown still runs cleanup
#[tokio::test]
#[serial]
async fn test_readiness_timeout_aborts_then_tears_down() {
    TestHelpers::clear_docker_host();
    let root = tempfile::tempdir().unwrap();
    let compose = ComposeScript::new()
        .expect(TestFixtures::SETUP, Vec::new())
        .expect(TestFixtures::PORT_QUERY, TestFixtures::port_output(TestFixtures::PUBLISHED_PORT))
        .expect_repeated_failure(TestFixtures::READINESS)
        .expect(TestFixtures::CLEANUP, Vec::new())
        .build();
    let config = TestHelpers::local_config(root.path()).build().unwrap();
    let cache_dir = config.cache_dir();
    let mut session = TestHelpers::lifecycle(config, compose);

    let err = session.start().await.unwrap_err();
    assert_matches!(err, HarnessError::ReadinessTimeout { ref service, attempts, .. } if service == "backend" && attempts >= 1);
    assert_eq!(session.state(), SessionState::Aborted);
    assert!(session.client().is_none());
    assert_eq!(
        session.endpoint(),
        Some(&shared::ServiceEndpoint::new("127.0.0.1", TestFixtures::PUBLISHED_PORT))
    );

    session.teardown().await.unwrap();
    assert!(!cache_dir.exists());
}

/// A failed setup command still gets the cleanup command
#[tokio::test]
async fn test_setup_failure_is_cleaned_up() {
    let root = tempfile::tempdir().unwrap();
    let compose = ComposeScript::new()
        .expect_failure(TestFixtures::SETUP, 1)
        .expect(TestFixtures::CLEANUP, Vec::new())
        .build();
    let config = TestHelpers::local_config(root.path()).build().unwrap();
    let mut session = TestHelpers::lifecycle(config, compose);

    let err = session.start().await.unwrap_err();
    assert_matches!(err, HarnessError::Subprocess { exit_code: Some(1), .. });
    assert_eq!(session.state(), SessionState::Aborted);
    assert!(session.endpoint().is_none());

    session.teardown().await.unwrap();
}

/// Cleanup failure is reported, but the cache directory is still removed
#[tokio::test]
#[serial]
async fn test_teardown_reports_cleanup_failure() {
    TestHelpers::clear_docker_host();
    let root = tempfile::tempdir().unwrap();
    let compose = ComposeScript::new()
        .healthy_start(TestFixtures::PUBLISHED_PORT)
        .expect_failure(TestFixtures::CLEANUP, 1)
        .build();
    let config = TestHelpers::local_config(root.path()).build().unwrap();
    let cache_dir = config.cache_dir();
    let mut session = TestHelpers::lifecycle(config, compose);

    session.start().await.unwrap();
    let err = session.teardown().await.unwrap_err();
    assert_matches!(err, HarnessError::Subprocess { .. });
    assert_eq!(session.state(), SessionState::TornDown);
    assert!(!cache_dir.exists());
}

/// keep_services skips the cleanup command; an unexpected `down` would panic the mock
#[tokio::test]
#[serial]
async fn test_keep_services_skips_cleanup_command() {
    TestHelpers::clear_docker_host();
    let root = tempfile::tempdir().unwrap();
    let compose = ComposeScript::new().healthy_start(TestFixtures::PUBLISHED_PORT).build();
    let config = TestHelpers::local_config(root.path()).keep_services(true).build().unwrap();
    let cache_dir = config.cache_dir();
    let mut session = TestHelpers::lifecycle(config, compose);

    session.start().await.unwrap();
    session.teardown().await.unwrap();
    assert!(!cache_dir.exists());
}

/// A kustomization override is mounted instead of a rendered one
#[tokio::test]
#[serial]
async fn test_kustomize_override_is_not_rendered() {
    TestHelpers::clear_docker_host();
    let root = tempfile::tempdir().unwrap();
    let override_file = root.path().join("custom-kustomization.yaml");
    std::fs::write(&override_file, "resources: []\n").unwrap();

    let compose = ComposeScript::new()
        .healthy_start(TestFixtures::PUBLISHED_PORT)
        .expect(TestFixtures::CLEANUP, Vec::new())
        .build();
    let config = TestHelpers::local_config(root.path())
        .kustomize_file(&override_file)
        .build()
        .unwrap();
    let mut session = TestHelpers::lifecycle(config, compose);

    session.start().await.unwrap();
    assert_eq!(session.artifacts().len(), 1);
    let compose_text = std::fs::read_to_string(&session.artifacts()[0].path).unwrap();
    assert!(compose_text.contains(&override_file.display().to_string()));

    session.teardown().await.unwrap();
    assert!(override_file.exists(), "override lives outside the cache directory");
}

/// Source-build registration runs inside the backend container
#[tokio::test]
#[serial]
async fn test_register_workloads_from_source() {
    TestHelpers::clear_docker_host();
    let root = tempfile::tempdir().unwrap();
    let compose = ComposeScript::new()
        .healthy_start(TestFixtures::PUBLISHED_PORT)
        .expect(
            "exec -T -e FLYTE_PROJECT=flytesnacks -e FLYTE_DOMAIN=development -e FLYTE_VERSION=v7 \
             -w /flyteorg/src backend make register",
            b"done\n".to_vec(),
        )
        .expect(TestFixtures::CLEANUP, Vec::new())
        .build();
    let config = TestHelpers::local_config(root.path()).version("v7").build().unwrap();
    let mut session = TestHelpers::lifecycle(config, compose);

    session.start().await.unwrap();
    let output = session.register_workloads().await.unwrap();
    assert_eq!(output, b"done\n");

    session.teardown().await.unwrap();
}

/// Registration needs a ready session
#[tokio::test]
async fn test_register_before_start_is_invalid_state() {
    let root = tempfile::tempdir().unwrap();
    let config = TestHelpers::local_config(root.path()).build().unwrap();
    let session = TestHelpers::lifecycle(config, ComposeScript::new().build());

    let err = session.register_workloads().await.unwrap_err();
    assert_matches!(
        err,
        HarnessError::InvalidState { ref expected, ref actual }
            if expected == "client-built" && actual == "uninitialized"
    );
}

/// Source-build registration is refused against a remote platform
#[tokio::test]
#[serial]
async fn test_remote_source_build_registration_rejected() {
    let root = tempfile::tempdir().unwrap();
    let config = TestHelpers::remote_config(root.path()).build().unwrap();
    let mut session = TestHelpers::lifecycle(config, ComposeScript::new().build());

    session.start().await.unwrap();
    let err = session.register_workloads().await.unwrap_err();
    assert_matches!(err, HarnessError::Configuration { .. });

    session.teardown().await.unwrap();
}

/// Starting twice is refused
#[tokio::test]
#[serial]
async fn test_start_twice_is_invalid_state() {
    let root = tempfile::tempdir().unwrap();
    let config = TestHelpers::remote_config(root.path()).build().unwrap();
    let mut session = TestHelpers::lifecycle(config, ComposeScript::new().build());

    session.start().await.unwrap();
    assert_matches!(session.start().await, Err(HarnessError::InvalidState { .. }));
    session.teardown().await.unwrap();
}

/// A remote session never created the cache directory, so it leaves it alone
#[tokio::test]
#[serial]
async fn test_remote_teardown_keeps_existing_cache_dir() {
    let root = tempfile::tempdir().unwrap();
    let foreign = root.path().join(".flyte_harness").join("other-session.yaml");
    std::fs::create_dir_all(foreign.parent().unwrap()).unwrap();
    std::fs::write(&foreign, "kind: Kustomization\n").unwrap();

    let config = TestHelpers::remote_config(root.path()).build().unwrap();
    let mut session = TestHelpers::lifecycle(config, ComposeScript::new().build());

    session.start().await.unwrap();
    session.teardown().await.unwrap();
    assert!(foreign.exists(), "cache directory of another session must survive");
}

/// Dropping a session that never rendered anything leaves the cache directory alone
#[test]
fn test_drop_before_start_keeps_existing_cache_dir() {
    let root = tempfile::tempdir().unwrap();
    let foreign = root.path().join(".flyte_harness").join("other-session.yaml");
    std::fs::create_dir_all(foreign.parent().unwrap()).unwrap();
    std::fs::write(&foreign, "kind: Kustomization\n").unwrap();

    let config = TestHelpers::local_config(root.path()).build().unwrap();
    drop(TestHelpers::lifecycle(config, ComposeScript::new().build()));
    assert!(foreign.exists());
}
