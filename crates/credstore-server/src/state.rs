use anyhow::Context;
use credstore_core::PolicyConfig;
use credstore_jwt::{JwtError, KeyPair, TokenSigner, TokenVerifier};
use credstore_policy::PolicyEngine;
use std::sync::Arc;

use crate::auth::{AuthService, CredStoreService, TokenBuilder, TokenLifetimes};
use crate::config::ServerConfig;
use crate::middleware::VerificationGate;

/// Shared application state.
///
/// Everything here is read-only after startup, so handlers share it without locks.
pub struct AppState {
    pub gate: VerificationGate,
    pub auth: AuthService,
    pub credstore: CredStoreService,
}

impl AppState {
    /// Wire the services around one policy and one signing key.
    pub fn new(
        policy: PolicyEngine,
        keypair: &KeyPair,
        lifetimes: TokenLifetimes,
    ) -> Result<Self, JwtError> {
        let signer = Arc::new(TokenSigner::new(keypair)?);
        let verifier = TokenVerifier::new(&keypair.public_key())?;
        let builder = TokenBuilder::new(Arc::new(policy), lifetimes);

        Ok(Self {
            gate: VerificationGate::new(verifier),
            auth: AuthService::new(builder.clone(), signer.clone(), keypair)?,
            credstore: CredStoreService::new(builder, signer),
        })
    }

    /// Load the key and policy named by `cfg` and build the state.
    pub fn init(cfg: &ServerConfig) -> anyhow::Result<Self> {
        let key_path = cfg.signing_key_file()?;
        let keypair = KeyPair::load_from_file(key_path)
            .with_context(|| format!("failed to load signing key {}", key_path.display()))?;

        let policy_path = cfg.policy_file()?;
        let policy = PolicyConfig::from_file(policy_path)
            .with_context(|| format!("failed to load policy {}", policy_path.display()))?;
        let policy = PolicyEngine::from_config_checked(policy)?;

        let lifetimes = cfg.tokens.lifetimes()?;
        tracing::info!(
            auth_ttl = %cfg.tokens.auth_ttl,
            rpc_ttl = %cfg.tokens.rpc_ttl,
            "token lifetimes"
        );

        Ok(Self::new(policy, &keypair, lifetimes)?)
    }
}
