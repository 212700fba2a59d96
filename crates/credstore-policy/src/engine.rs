//! Policy lookups used to decide escalation eligibility.

use crate::error::PolicyError;
use crate::validate::{Severity, validate_policy};
use credstore_core::config::{Authorization, PolicyConfig, Scope};

/// Outcome of resolving `(client, target)` against the policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<'a> {
    /// A binding matched and its scope exists.
    Granted(&'a Scope),

    /// No binding for this `(client, target)` pair.
    NoBinding,

    /// A binding matched but names a scope that is not defined.
    DanglingScope { scope: &'a str },
}

/// Read-only view over a loaded policy.
///
/// Lookups are linear in the number of clients, scopes and bindings; policies
/// are operationally small. Bindings resolve first-match in declared order.
#[derive(Debug, Clone)]
pub struct PolicyEngine {
    policy: PolicyConfig,
}

impl PolicyEngine {
    /// Wrap a policy without validating it.
    pub fn new(policy: PolicyConfig) -> Self {
        Self { policy }
    }

    /// Validate a policy and wrap it.
    ///
    /// Warnings are logged; any error-level finding rejects the policy.
    pub fn from_config_checked(policy: PolicyConfig) -> Result<Self, PolicyError> {
        let issues = validate_policy(&policy);

        for issue in &issues {
            match issue.severity {
                Severity::Warning => {
                    tracing::warn!(location = %issue.location, "{}", issue.message)
                }
                Severity::Error => {
                    tracing::error!(location = %issue.location, "{}", issue.message)
                }
            }
        }

        let errors: Vec<_> = issues
            .into_iter()
            .filter(|i| i.severity == Severity::Error)
            .collect();
        if !errors.is_empty() {
            return Err(PolicyError::Invalid { issues: errors });
        }

        tracing::info!(
            clients = policy.clients.len(),
            scopes = policy.scopes.len(),
            authorizations = policy.authorizations.len(),
            "Policy loaded"
        );
        Ok(Self::new(policy))
    }

    /// Exact, case-sensitive membership test against the client list.
    pub fn is_known_client(&self, client: &str) -> bool {
        self.policy.clients.iter().any(|c| c == client)
    }

    /// First binding whose client and target both match.
    pub fn find_authorization(&self, client: &str, target: &str) -> Option<&Authorization> {
        self.policy
            .authorizations
            .iter()
            .find(|a| a.client == client && a.via == target)
    }

    /// Scope by name.
    pub fn find_scope(&self, name: &str) -> Option<&Scope> {
        self.policy.scopes.iter().find(|s| s.name == name)
    }

    /// Resolve the scope granted to `client` when calling `target`.
    pub fn resolve_scope(&self, client: &str, target: &str) -> Resolution<'_> {
        let Some(binding) = self.find_authorization(client, target) else {
            return Resolution::NoBinding;
        };

        match self.find_scope(&binding.scope) {
            Some(scope) => Resolution::Granted(scope),
            None => Resolution::DanglingScope {
                scope: &binding.scope,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope(name: &str, service: &str, method: &str) -> Scope {
        Scope {
            name: name.into(),
            service: service.into(),
            method: method.into(),
        }
    }

    fn binding(client: &str, scope: &str, via: &str) -> Authorization {
        Authorization {
            client: client.into(),
            scope: scope.into(),
            via: via.into(),
        }
    }

    fn engine() -> PolicyEngine {
        PolicyEngine::new(config())
    }

    fn config() -> PolicyConfig {
        PolicyConfig {
            scopes: vec![
                scope("billing", "Billing", "Charge"),
                scope("refunds", "Billing", "Refund"),
            ],
            clients: vec!["svc-a".into(), "svc-b".into()],
            authorizations: vec![
                binding("svc-a", "billing", "billing.internal"),
                binding("svc-b", "refunds", "billing.internal"),
                binding("svc-b", "missing", "ledger.internal"),
            ],
        }
    }

    #[test]
    fn test_known_client_is_exact() {
        let engine = engine();
        assert!(engine.is_known_client("svc-a"));
        assert!(!engine.is_known_client("SVC-A"));
        assert!(!engine.is_known_client("svc-a "));
        assert!(!engine.is_known_client(""));
    }

    #[test]
    fn test_resolve_granted() {
        let engine = engine();
        assert_eq!(
            engine.resolve_scope("svc-a", "billing.internal"),
            Resolution::Granted(&scope("billing", "Billing", "Charge"))
        );
        assert_eq!(
            engine.resolve_scope("svc-b", "billing.internal"),
            Resolution::Granted(&scope("refunds", "Billing", "Refund"))
        );
    }

    #[test]
    fn test_resolve_no_binding() {
        let engine = engine();
        assert_eq!(
            engine.resolve_scope("svc-a", "other.internal"),
            Resolution::NoBinding
        );
        assert_eq!(
            engine.resolve_scope("svc-c", "billing.internal"),
            Resolution::NoBinding
        );
    }

    #[test]
    fn test_resolve_dangling_scope() {
        let engine = engine();
        assert_eq!(
            engine.resolve_scope("svc-b", "ledger.internal"),
            Resolution::DanglingScope { scope: "missing" }
        );
    }

    #[test]
    fn test_first_match_wins() {
        let engine = PolicyEngine::new(PolicyConfig {
            scopes: vec![
                scope("billing", "Billing", "Charge"),
                scope("refunds", "Billing", "Refund"),
            ],
            clients: vec!["svc-a".into()],
            authorizations: vec![
                binding("svc-a", "refunds", "billing.internal"),
                binding("svc-a", "billing", "billing.internal"),
            ],
        });

        assert_eq!(
            engine.resolve_scope("svc-a", "billing.internal"),
            Resolution::Granted(&scope("refunds", "Billing", "Refund"))
        );
    }

    #[test]
    fn test_checked_rejects_ambiguous_bindings() {
        let policy = PolicyConfig {
            scopes: vec![
                scope("billing", "Billing", "Charge"),
                scope("refunds", "Billing", "Refund"),
            ],
            clients: vec!["svc-a".into()],
            authorizations: vec![
                binding("svc-a", "refunds", "billing.internal"),
                binding("svc-a", "billing", "billing.internal"),
            ],
        };

        let err = PolicyEngine::from_config_checked(policy).unwrap_err();
        let PolicyError::Invalid { issues } = err;
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Error);
    }

    #[test]
    fn test_checked_accepts_warnings() {
        let engine = PolicyEngine::from_config_checked(config()).unwrap();
        assert!(engine.is_known_client("svc-b"));
    }
}
