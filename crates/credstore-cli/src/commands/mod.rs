//! CLI command implementations for CredStore operators.

pub mod check;
pub mod keys;
pub mod token;
