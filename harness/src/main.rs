//! Flyte harness runner
//!
//! Brings a sandbox session up from the command line:
//! - Renders configuration and starts the compose stack (or attaches to a remote platform)
//! - Waits for readiness and builds the admin client
//! - Optionally registers workloads
//! - Tears everything down again unless asked to keep it running

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use serde_json::json;

use flyte_harness::runtime::compose::DEFAULT_COMPOSE_COMMAND;
use flyte_harness::{ComposeExecutor, SessionConfig, SessionLifecycle};
use shared::logging::{self, init_tracing};
use shared::{Component, component_error, component_info, component_warn};

#[derive(Parser)]
#[command(name = "flyte-harness")]
#[command(about = "Disposable Flyte sandbox sessions for integration tests")]
struct Args {
    /// Run against a local compose-managed sandbox (true/false, yes/no, 1/0)
    #[arg(long, value_parser = parse_boolish)]
    local: Option<bool>,

    /// Address of an already running platform, e.g. http://10.0.0.5:30081
    #[arg(long)]
    flyte_platform_url: Option<String>,

    /// Pre-serialized registration payload (requires --source)
    #[arg(long)]
    proto_path: Option<PathBuf>,

    /// Workflow source directory (defaults to the root directory)
    #[arg(long)]
    source: Option<PathBuf>,

    /// Kustomization file to use instead of the rendered one
    #[arg(long)]
    kustomize_file: Option<PathBuf>,

    /// Root directory; rendered artifacts go to <root>/.flyte_harness
    #[arg(long, default_value = ".")]
    root_dir: PathBuf,

    #[arg(long, default_value = "flytesnacks")]
    project: String,

    #[arg(long, default_value = "development")]
    domain: String,

    /// Registration version (defaults to v<pid>)
    #[arg(long)]
    version: Option<String>,

    /// Register workloads once the platform is ready
    #[arg(long)]
    register: bool,

    /// Wait for Ctrl+C before tearing the session down
    #[arg(long)]
    keep_running: bool,

    /// Leave composed services running at teardown
    #[arg(long)]
    keep_services: bool,

    /// Readiness budget in seconds
    #[arg(long, default_value = "900")]
    timeout_secs: u64,

    /// Compose tool invocation
    #[arg(long, default_value = DEFAULT_COMPOSE_COMMAND)]
    compose_command: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Enable verbose tracing output
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env may supply FLYTE_PLATFORM_URL, DOCKER_HOST or RUST_LOG
    dotenv::dotenv().ok();

    let args = Args::parse();
    init_tracing(Some(&args.log_level), args.verbose);
    logging::log_startup(Component::Cli, &format!("root dir {}", args.root_dir.display()));

    let config = build_config(&args).context("invalid harness configuration")?;
    let mut session = SessionLifecycle::from_config(config)?;

    let outcome = run_session(&mut session, &args).await;
    if let Err(ref e) = outcome {
        logging::log_error(Component::Cli, "Session failed", e);
    }

    let teardown = session.teardown().await;
    if let Err(ref e) = teardown {
        component_error!(Component::Cli, "❌ Teardown failed: {}", e);
    }

    outcome?;
    teardown?;
    component_info!(Component::Cli, "🏁 Harness session completed");
    Ok(())
}

fn build_config(args: &Args) -> flyte_harness::HarnessResult<SessionConfig> {
    // Neither mode option given means a local sandbox
    let local = match (args.local, &args.flyte_platform_url) {
        (None, None) => Some(true),
        (local, _) => local,
    };

    let mut builder = SessionConfig::builder()
        .root_dir(&args.root_dir)
        .project(&args.project)
        .domain(&args.domain)
        .compose_command(&args.compose_command)
        .readiness(Duration::from_secs(args.timeout_secs), Duration::from_secs(1))
        .keep_services(args.keep_services);

    if let Some(local) = local {
        builder = builder.local(local);
    }
    if let Some(ref url) = args.flyte_platform_url {
        builder = builder.platform_url(url.as_str());
    }
    if let Some(ref source) = args.source {
        builder = builder.source_dir(source);
    }
    if let Some(ref payload) = args.proto_path {
        builder = builder.payload_path(payload);
    }
    if let Some(ref kustomize) = args.kustomize_file {
        builder = builder.kustomize_file(kustomize);
    }
    if let Some(ref version) = args.version {
        builder = builder.version(version.as_str());
    }

    builder.build()
}

async fn run_session(session: &mut SessionLifecycle<ComposeExecutor>, args: &Args) -> anyhow::Result<()> {
    session.start().await?;

    let endpoint = session
        .endpoint()
        .map(|endpoint| endpoint.address())
        .unwrap_or_default();
    let summary = json!({
        "mode": session.config().mode.to_string(),
        "endpoint": endpoint,
        "insecure": session.config().insecure,
        "state": session.state().to_string(),
        "artifacts": session
            .artifacts()
            .iter()
            .map(|artifact| artifact.path.display().to_string())
            .collect::<Vec<_>>(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    if args.register {
        session.register_workloads().await.context("workload registration failed")?;
        logging::log_success(Component::Registrar, "Workloads registered");
    }

    if let Some(client) = session.client() {
        match client.list_projects(5).await {
            Ok(projects) => {
                let names: Vec<_> = projects.iter().map(|project| project.name.as_str()).collect();
                component_info!(Component::Client, "📋 Projects: {:?}", names);
            }
            Err(e) => component_warn!(Component::Client, "⚠️ Could not list projects: {}", e),
        }
    }

    if args.keep_running {
        component_info!(Component::Cli, "🔄 Keeping session running (--keep-running flag set)");
        component_info!(Component::Cli, "Press Ctrl+C to tear the session down");
        tokio::signal::ctrl_c().await?;
    }

    Ok(())
}

fn parse_boolish(value: &str) -> Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(format!("expected a boolean, got '{other}'")),
    }
}
