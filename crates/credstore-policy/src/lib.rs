//! CredStore Policy Engine
//!
//! Decides whether a client may escalate a token:
//! 1. [`PolicyEngine::is_known_client`] is the single point of client allow-listing
//! 2. [`PolicyEngine::resolve_scope`] maps `(client, target)` to the granted scope
//! 3. [`validate_policy`] flags configurations the engine would resolve ambiguously
//!
//! The engine only reads the policy it was built from; it is shared by
//! reference across all request handlers.

pub mod engine;
pub mod error;
pub mod validate;

pub use engine::{PolicyEngine, Resolution};
pub use error::PolicyError;
pub use validate::{PolicyIssue, Severity, validate_policy};
