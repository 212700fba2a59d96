//! Configuration types for CredStore.
//!
//! # Configuration Files
//!
//! - **policy.yaml**: scopes, known clients and authorization bindings. Loaded
//!   once at startup and never mutated afterwards.

pub mod policy;

pub use policy::{Authorization, PolicyConfig, Scope};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
