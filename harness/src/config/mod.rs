//! Configuration Management
//!
//! This module provides the session configuration and its builder.

pub mod builder;
pub mod session;

// Re-export main types
pub use builder::SessionConfigBuilder;
pub use session::SessionConfig;
