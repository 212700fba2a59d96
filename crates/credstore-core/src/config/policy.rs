//! Policy file: scopes, clients and authorization bindings.
//!
//! ```yaml
//! scopes:
//!   - name: billing
//!     service: Billing
//!     method: Charge
//! clients:
//!   - svc-a
//! authorizations:
//!   - client: svc-a
//!     scope: billing
//!     via: billing.internal
//! ```

use super::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A named `(service, method)` pair that a policy can grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    /// Unique scope name, referenced by authorization bindings.
    pub name: String,

    /// RPC service the scope authorizes.
    pub service: String,

    /// RPC method the scope authorizes.
    pub method: String,
}

/// Grants `client` the named `scope` when calling the target `via`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authorization {
    /// Client identity the binding applies to.
    pub client: String,

    /// Name of a [`Scope`] in the same policy.
    pub scope: String,

    /// Target system being reached (DNS name or logical identifier).
    pub via: String,
}

/// The complete policy document.
///
/// All three lists are optional in the file; an empty policy denies
/// everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfig {
    #[serde(default)]
    pub scopes: Vec<Scope>,

    /// Allow-listed client identities, in declared order.
    #[serde(default)]
    pub clients: Vec<String>,

    /// Authorization bindings, in declared order.
    #[serde(default)]
    pub authorizations: Vec<Authorization>,
}

impl PolicyConfig {
    /// Load a policy from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse a policy from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(ConfigError::from)
    }
}
