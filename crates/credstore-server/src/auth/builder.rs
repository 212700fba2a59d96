//! Builds the claims of the next tier from verified claims of the tier below.
//!
//! Every builder method takes a [`Verified`] claim set, so a token can only be
//! escalated from a credential that already passed verification.

use chrono::Duration;
use credstore_jwt::{AppClaims, AuthClaims, ClaimError, RpcClaims, TierClaims, Verified};
use credstore_policy::{PolicyEngine, Resolution};
use std::sync::Arc;
use thiserror::Error;

use crate::error::Status;

/// Lifetimes of server-issued tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenLifetimes {
    pub auth: Duration,
    pub rpc: Duration,
}

impl Default for TokenLifetimes {
    fn default() -> Self {
        Self {
            auth: Duration::hours(1),
            rpc: Duration::minutes(5),
        }
    }
}

/// Policy refused an escalation, or the next-tier claims could not be built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EscalationError {
    #[error("client {client} is not authorized to access this server")]
    UnknownClient { client: String },

    #[error("client {client} doesn't have a scope for {target}")]
    NoScope { client: String, target: String },

    #[error("client {client} requested scope {scope} for {target}, but no such scope is available")]
    DanglingScope {
        client: String,
        scope: String,
        target: String,
    },

    #[error("cannot issue token: {0}")]
    Lifetime(#[from] ClaimError),
}

impl From<EscalationError> for Status {
    fn from(err: EscalationError) -> Self {
        match err {
            EscalationError::UnknownClient { .. } | EscalationError::NoScope { .. } => {
                Status::permission_denied(err.to_string())
            }
            EscalationError::DanglingScope { .. } | EscalationError::Lifetime(_) => {
                Status::internal(err.to_string())
            }
        }
    }
}

/// Token builder bound to a policy.
#[derive(Debug, Clone)]
pub struct TokenBuilder {
    policy: Arc<PolicyEngine>,
    lifetimes: TokenLifetimes,
}

impl TokenBuilder {
    pub fn new(policy: Arc<PolicyEngine>, lifetimes: TokenLifetimes) -> Self {
        Self { policy, lifetimes }
    }

    /// Auth claims for the client named in a verified app token.
    pub fn build_auth_claims(
        &self,
        app: &Verified<AppClaims>,
    ) -> Result<AuthClaims, EscalationError> {
        let client = app.client();
        self.ensure_known(client)?;
        Ok(AuthClaims::issue(client, self.lifetimes.auth)?)
    }

    /// RPC claims authorizing the client of a verified auth token to call `target`.
    ///
    /// Client membership is checked again so that removing a client from the
    /// policy revokes its outstanding auth tokens.
    pub fn build_rpc_claims(
        &self,
        auth: &Verified<AuthClaims>,
        target: &str,
    ) -> Result<RpcClaims, EscalationError> {
        let client = auth.client();
        self.ensure_known(client)?;

        match self.policy.resolve_scope(client, target) {
            Resolution::Granted(scope) => Ok(RpcClaims::issue(
                client,
                &scope.service,
                &scope.method,
                self.lifetimes.rpc,
            )?),
            Resolution::NoBinding => Err(EscalationError::NoScope {
                client: client.to_string(),
                target: target.to_string(),
            }),
            Resolution::DanglingScope { scope } => Err(EscalationError::DanglingScope {
                client: client.to_string(),
                scope: scope.to_string(),
                target: target.to_string(),
            }),
        }
    }

    fn ensure_known(&self, client: &str) -> Result<(), EscalationError> {
        if self.policy.is_known_client(client) {
            Ok(())
        } else {
            Err(EscalationError::UnknownClient {
                client: client.to_string(),
            })
        }
    }
}
