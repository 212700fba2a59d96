//! Token escalation: claim building and the services that sign the results.

pub mod builder;
pub mod service;

pub use builder::{EscalationError, TokenBuilder, TokenLifetimes};
pub use service::{AuthService, CredStoreService};
