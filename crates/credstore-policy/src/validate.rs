//! Consistency checks over a policy document.
//!
//! Errors make a policy unservable. Warnings point at entries that can never
//! take effect or that only fail at request time.

use credstore_core::config::PolicyConfig;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Severity level for a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// The entry is suspicious but the policy can still be served.
    Warning,
    /// The policy is invalid.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "WARN"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// A single validation finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyIssue {
    pub severity: Severity,
    /// Location within the document, e.g. `authorizations[2]`.
    pub location: String,
    pub message: String,
}

impl PolicyIssue {
    fn error(location: String, message: String) -> Self {
        Self {
            severity: Severity::Error,
            location,
            message,
        }
    }

    fn warning(location: String, message: String) -> Self {
        Self {
            severity: Severity::Warning,
            location,
            message,
        }
    }
}

impl fmt::Display for PolicyIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.location, self.message)
    }
}

/// Run every consistency check over `policy`.
pub fn validate_policy(policy: &PolicyConfig) -> Vec<PolicyIssue> {
    let mut issues = Vec::new();
    check_clients(policy, &mut issues);
    check_scopes(policy, &mut issues);
    check_authorizations(policy, &mut issues);
    issues
}

fn check_clients(policy: &PolicyConfig, issues: &mut Vec<PolicyIssue>) {
    let mut seen = HashSet::new();
    for (i, client) in policy.clients.iter().enumerate() {
        let location = format!("clients[{}]", i);
        if client.trim().is_empty() {
            issues.push(PolicyIssue::error(location, "client id is empty".into()));
        } else if !seen.insert(client.as_str()) {
            issues.push(PolicyIssue::warning(
                location,
                format!("client '{}' is listed more than once", client),
            ));
        }
    }
}

fn check_scopes(policy: &PolicyConfig, issues: &mut Vec<PolicyIssue>) {
    let mut seen = HashSet::new();
    for (i, scope) in policy.scopes.iter().enumerate() {
        let location = format!("scopes[{}]", i);
        for (field, value) in [
            ("name", &scope.name),
            ("service", &scope.service),
            ("method", &scope.method),
        ] {
            if value.trim().is_empty() {
                issues.push(PolicyIssue::error(
                    location.clone(),
                    format!("scope {} is empty", field),
                ));
            }
        }
        if !scope.name.is_empty() && !seen.insert(scope.name.as_str()) {
            issues.push(PolicyIssue::error(
                location,
                format!("scope '{}' is defined more than once", scope.name),
            ));
        }
    }
}

fn check_authorizations(policy: &PolicyConfig, issues: &mut Vec<PolicyIssue>) {
    let clients: HashSet<&str> = policy.clients.iter().map(String::as_str).collect();
    let scopes: HashSet<&str> = policy.scopes.iter().map(|s| s.name.as_str()).collect();
    let mut first_binding: HashMap<(&str, &str), (usize, &str)> = HashMap::new();

    for (i, auth) in policy.authorizations.iter().enumerate() {
        let location = format!("authorizations[{}]", i);

        let mut complete = true;
        for (field, value) in [
            ("client", &auth.client),
            ("scope", &auth.scope),
            ("via", &auth.via),
        ] {
            if value.trim().is_empty() {
                complete = false;
                issues.push(PolicyIssue::error(
                    location.clone(),
                    format!("authorization {} is empty", field),
                ));
            }
        }
        if !complete {
            continue;
        }

        if !clients.contains(auth.client.as_str()) {
            issues.push(PolicyIssue::warning(
                location.clone(),
                format!(
                    "client '{}' is not in the clients list; binding can never match",
                    auth.client
                ),
            ));
        }
        if !scopes.contains(auth.scope.as_str()) {
            issues.push(PolicyIssue::warning(
                location.clone(),
                format!(
                    "scope '{}' is not defined; requests via '{}' will fail",
                    auth.scope, auth.via
                ),
            ));
        }

        let key = (auth.client.as_str(), auth.via.as_str());
        match first_binding.get(&key).copied() {
            None => {
                first_binding.insert(key, (i, auth.scope.as_str()));
            }
            Some((first, scope)) if scope == auth.scope => {
                issues.push(PolicyIssue::warning(
                    location,
                    format!("duplicate of authorizations[{}]", first),
                ));
            }
            Some((first, scope)) => {
                issues.push(PolicyIssue::error(
                    location,
                    format!(
                        "client '{}' via '{}' is already bound to scope '{}' \
                         at authorizations[{}]; conflicting scope '{}'",
                        auth.client, auth.via, scope, first, auth.scope
                    ),
                ));
            }
        }
    }
}
