//! Shared types for CredStore.
//!
//! The policy file is read by the server, the policy engine and the CLI; the
//! RPC bodies are spoken by both the server and the client.

// Wire types for the RPC surface
pub mod api;

// Configuration types shared across all CredStore crates
pub mod config;

pub use config::{Authorization, ConfigError, PolicyConfig, Scope};
