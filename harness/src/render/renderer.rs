//! Configuration renderer
//!
//! Renders the kustomization and compose templates into the session cache
//! directory. Templates are compiled into the binary and rendered with strict
//! undefined handling, so a missing parameter is an error rather than an empty
//! string in the output.

use std::fs;
use std::path::{Path, PathBuf};

use minijinja::{Environment, UndefinedBehavior};
use serde::Serialize;
use sha2::{Digest, Sha256};

use shared::{Component, component_debug, component_info};

use crate::error::{HarnessError, HarnessResult};

pub const KUSTOMIZATION_TEMPLATE: &str = "kustomization.yaml.j2";
pub const COMPOSE_TEMPLATE: &str = "docker-compose.yaml.j2";

/// Compose document name; constant so the executor can be built before rendering
pub const COMPOSE_FILE_NAME: &str = "docker-compose.yaml";

/// Flyte release the sandbox kustomization overlays
pub const DEFAULT_FLYTE_VERSION: &str = "v0.17.0";

const KUSTOMIZATION_SOURCE: &str = include_str!("../../templates/kustomization.yaml.j2");
const COMPOSE_SOURCE: &str = include_str!("../../templates/docker-compose.yaml.j2");

/// A rendered configuration document on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedArtifact {
    pub template: String,
    pub path: PathBuf,
    /// Hex SHA-256 of the rendered text
    pub checksum: String,
}

/// Parameters of the kustomization template
#[derive(Debug, Clone, Serialize)]
pub struct KustomizationParams {
    pub namespace: String,
    pub flyte_version: String,
    pub extra_resources: Vec<String>,
}

impl Default for KustomizationParams {
    fn default() -> Self {
        Self {
            namespace: "flyte".to_string(),
            flyte_version: DEFAULT_FLYTE_VERSION.to_string(),
            extra_resources: Vec::new(),
        }
    }
}

/// Parameters of the compose template
#[derive(Debug, Clone, Serialize)]
pub struct ComposeParams {
    pub build_context_dir: String,
    pub flyte_workflows_source_dir: String,
    pub kustomization_file_path: String,
    pub compose_service: String,
    pub admin_port: u16,
}

pub struct ConfigRenderer {
    env: Environment<'static>,
    cache_dir: PathBuf,
}

impl ConfigRenderer {
    /// Create a renderer writing into `cache_dir`. The directory is not created here.
    pub fn new(cache_dir: impl Into<PathBuf>) -> HarnessResult<Self> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.add_template(KUSTOMIZATION_TEMPLATE, KUSTOMIZATION_SOURCE)
            .map_err(|e| HarnessError::template(KUSTOMIZATION_TEMPLATE, &e))?;
        env.add_template(COMPOSE_TEMPLATE, COMPOSE_SOURCE)
            .map_err(|e| HarnessError::template(COMPOSE_TEMPLATE, &e))?;

        Ok(Self {
            env,
            cache_dir: cache_dir.into(),
        })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Where the compose document lands once rendered
    pub fn compose_file_path(&self) -> PathBuf {
        self.cache_dir.join(COMPOSE_FILE_NAME)
    }

    /// Render `template` with `params` into the cache directory.
    ///
    /// Identical inputs give an identical checksum and path; an artifact that
    /// already holds the same text is left untouched.
    pub fn render<S: Serialize>(&self, template: &str, params: S) -> HarnessResult<RenderedArtifact> {
        let text = self.render_text(template, params)?;
        let checksum = format!("{:x}", Sha256::digest(text.as_bytes()));
        let path = self.cache_dir.join(artifact_file_name(template, &checksum));

        let unchanged = fs::read_to_string(&path).map(|existing| existing == text).unwrap_or(false);
        if unchanged {
            component_debug!(Component::Renderer, "♻️ Reusing {}", path.display());
        } else {
            fs::write(&path, &text)?;
            component_info!(Component::Renderer, "📝 Rendered {} → {}", template, path.display());
        }

        Ok(RenderedArtifact {
            template: template.to_string(),
            path,
            checksum,
        })
    }

    /// Render without touching the filesystem
    pub fn render_text<S: Serialize>(&self, template: &str, params: S) -> HarnessResult<String> {
        let mut text = self
            .env
            .get_template(template)
            .and_then(|t| t.render(params))
            .map_err(|e| HarnessError::template(template, &e))?;
        if !text.ends_with('\n') {
            text.push('\n');
        }
        Ok(text)
    }

    pub fn render_kustomization(&self, params: &KustomizationParams) -> HarnessResult<RenderedArtifact> {
        self.render(KUSTOMIZATION_TEMPLATE, params)
    }

    pub fn render_compose(&self, params: &ComposeParams) -> HarnessResult<RenderedArtifact> {
        self.render(COMPOSE_TEMPLATE, params)
    }
}

/// Compose document keeps a constant name; everything else is named by checksum
fn artifact_file_name(template: &str, checksum: &str) -> String {
    if template == COMPOSE_TEMPLATE {
        return COMPOSE_FILE_NAME.to_string();
    }

    let name = template.strip_suffix(".j2").unwrap_or(template);
    match name.split_once('.') {
        Some((stem, ext)) => format!("{stem}-{checksum}.{ext}"),
        None => format!("{name}-{checksum}"),
    }
}
