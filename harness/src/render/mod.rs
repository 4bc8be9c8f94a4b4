//! Configuration rendering
//!
//! Turns session parameters into the kustomization and compose documents the
//! sandbox is started from.

pub mod renderer;

pub use renderer::{
    COMPOSE_FILE_NAME, COMPOSE_TEMPLATE, ComposeParams, ConfigRenderer, KUSTOMIZATION_TEMPLATE,
    KustomizationParams, RenderedArtifact,
};
