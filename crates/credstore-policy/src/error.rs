//! Error types for policy loading.

use crate::validate::PolicyIssue;
use thiserror::Error;

/// Errors that prevent a policy from being served.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// The policy has one or more error-level findings.
    #[error("policy is invalid: {}", summarize(.issues))]
    Invalid { issues: Vec<PolicyIssue> },
}

fn summarize(issues: &[PolicyIssue]) -> String {
    issues
        .iter()
        .map(|i| i.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}
