//! The two CredStore services.
//!
//! Handlers here are transport-agnostic. They receive claims that the gate has
//! already verified and return wire replies or a [`Status`].

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use credstore_core::api::{AuthReply, GetTokenReply, GetTokenRequest, SigningKeyReply};
use credstore_jwt::{AppClaims, AuthClaims, JwtError, KeyPair, TierClaims, TokenSigner, Verified};
use std::sync::Arc;
use tracing::{error, info, warn};

use super::builder::TokenBuilder;
use crate::error::Status;

fn sign<C: TierClaims>(signer: &TokenSigner, claims: &C) -> Result<String, Status> {
    signer.sign(claims).map_err(|err| {
        error!(client = %claims.client(), error = %err, "failed to sign token");
        Status::internal(format!("failed to sign JWT payload: {}", err))
    })
}

/// Signing key query and session token exchange.
pub struct AuthService {
    builder: TokenBuilder,
    signer: Arc<TokenSigner>,
    public_key_der: Vec<u8>,
}

impl AuthService {
    pub fn new(
        builder: TokenBuilder,
        signer: Arc<TokenSigner>,
        keypair: &KeyPair,
    ) -> Result<Self, JwtError> {
        Ok(Self {
            builder,
            signer,
            public_key_der: keypair.public_key_der()?,
        })
    }

    /// The public half of the signing key, base64 of its SPKI DER encoding.
    pub fn signing_key(&self) -> SigningKeyReply {
        SigningKeyReply {
            signing_key: STANDARD.encode(&self.public_key_der),
        }
    }

    /// Exchange a verified app token for an auth token.
    pub fn auth(&self, app: Verified<AppClaims>) -> Result<AuthReply, Status> {
        let claims = self.builder.build_auth_claims(&app).map_err(|err| {
            warn!(client = %app.client(), "auth token refused: {}", err);
            Status::from(err)
        })?;
        let auth_jwt = sign(&self.signer, &claims)?;

        info!(
            client = %claims.client(),
            expires_at = claims.expires_at(),
            "issued auth token"
        );
        Ok(AuthReply { auth_jwt })
    }
}

/// Per-call token exchange.
pub struct CredStoreService {
    builder: TokenBuilder,
    signer: Arc<TokenSigner>,
}

impl CredStoreService {
    pub fn new(builder: TokenBuilder, signer: Arc<TokenSigner>) -> Self {
        Self { builder, signer }
    }

    /// Exchange a verified auth token for an RPC token scoped to `request.target`.
    pub fn get_token(
        &self,
        auth: Verified<AuthClaims>,
        request: GetTokenRequest,
    ) -> Result<GetTokenReply, Status> {
        let target = request.target.as_str();
        if target.trim().is_empty() {
            return Err(Status::invalid_argument("target must not be empty"));
        }

        let claims = self
            .builder
            .build_rpc_claims(&auth, target)
            .map_err(|err| {
                warn!(client = %auth.client(), rpc_target = target, "rpc token refused: {}", err);
                Status::from(err)
            })?;
        let session_jwt = sign(&self.signer, &claims)?;

        info!(
            client = %claims.client(),
            rpc_target = target,
            service = %claims.service(),
            method = %claims.method(),
            "issued rpc token"
        );
        Ok(GetTokenReply { session_jwt })
    }
}
