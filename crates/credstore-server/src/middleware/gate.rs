//! Bearer credential verification for the CredStore endpoints.
//!
//! Each endpoint admits exactly one token tier. Every rejection answers with
//! the same message; the reason only goes to the log.

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use credstore_core::api;
use credstore_jwt::{Tier, TierClaims, TokenVerifier, Verified};
use std::fmt;

use crate::error::Status;

const REJECTED: &str = "cannot verify bearer credential";

/// RPC endpoints exposed by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    SigningKey,
    Auth,
    GetToken,
}

impl Endpoint {
    pub const ALL: [Endpoint; 3] = [Endpoint::SigningKey, Endpoint::Auth, Endpoint::GetToken];

    /// Route path, `/<package>.<Service>/<Method>`.
    pub const fn path(self) -> &'static str {
        match self {
            Endpoint::SigningKey => api::SIGNING_KEY_PATH,
            Endpoint::Auth => api::AUTH_PATH,
            Endpoint::GetToken => api::GET_TOKEN_PATH,
        }
    }

    /// Tier of bearer token the endpoint admits, or `None` for open endpoints.
    pub const fn required_tier(self) -> Option<Tier> {
        match self {
            Endpoint::SigningKey => None,
            Endpoint::Auth => Some(Tier::App),
            Endpoint::GetToken => Some(Tier::Auth),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Verifies bearer credentials before a handler runs.
///
/// The handler's claim type decides what is accepted: `admit::<AppClaims>`
/// yields a `Verified<AppClaims>` and nothing else, so a token of the wrong
/// tier can never reach a handler.
pub struct VerificationGate {
    verifier: TokenVerifier,
}

impl VerificationGate {
    pub fn new(verifier: TokenVerifier) -> Self {
        Self { verifier }
    }

    /// Verify the bearer credential of a call to `endpoint`.
    ///
    /// Rejections carry a fixed message; the precise reason is logged.
    pub fn admit<C: TierClaims>(
        &self,
        endpoint: Endpoint,
        headers: &HeaderMap,
    ) -> Result<Verified<C>, Status> {
        if endpoint.required_tier() != Some(C::TIER) {
            tracing::error!(
                endpoint = %endpoint,
                handler_tier = %C::TIER,
                "endpoint is wired to a handler of the wrong tier"
            );
            return Err(Status::internal("endpoint misconfigured"));
        }

        let token = extract_bearer(headers).map_err(|reason| {
            tracing::warn!(endpoint = %endpoint, reason, "rejected call");
            Status::unauthenticated(REJECTED)
        })?;

        self.verifier.verify::<C>(token).map_err(|err| {
            tracing::warn!(endpoint = %endpoint, error = %err, "rejected call");
            Status::unauthenticated(REJECTED)
        })
    }
}

/// The token of an `authorization: Bearer <token>` header.
fn extract_bearer(headers: &HeaderMap) -> Result<&str, &'static str> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or("no authorization header")?
        .to_str()
        .map_err(|_| "authorization header is not ASCII")?;

    let (scheme, token) = value
        .trim()
        .split_once(' ')
        .ok_or("authorization header has no scheme")?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err("authorization scheme is not bearer");
    }

    let token = token.trim();
    if token.is_empty() {
        return Err("bearer token is empty");
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use chrono::Duration;
    use credstore_core::api::Code;
    use credstore_jwt::{AppClaims, AuthClaims, KeyPair, RpcClaims, TokenSigner};

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    fn gate_and_signer() -> (VerificationGate, TokenSigner) {
        let keypair = KeyPair::generate();
        let gate = VerificationGate::new(TokenVerifier::new(&keypair.public_key()).unwrap());
        (gate, TokenSigner::new(&keypair).unwrap())
    }

    #[test]
    fn test_extract_bearer() {
        assert_eq!(extract_bearer(&headers("Bearer abc")).unwrap(), "abc");
        assert_eq!(extract_bearer(&headers("bearer  abc ")).unwrap(), "abc");
        assert!(extract_bearer(&headers("Basic abc")).is_err());
        assert!(extract_bearer(&headers("Bearer ")).is_err());
        assert!(extract_bearer(&headers("abc")).is_err());
        assert!(extract_bearer(&HeaderMap::new()).is_err());
    }

    #[test]
    fn test_endpoint_tiers() {
        assert_eq!(Endpoint::SigningKey.required_tier(), None);
        assert_eq!(Endpoint::Auth.required_tier(), Some(Tier::App));
        assert_eq!(Endpoint::GetToken.required_tier(), Some(Tier::Auth));
    }

    #[test]
    fn test_admit_matching_tier() {
        let (gate, signer) = gate_and_signer();
        let token = signer.sign(&AppClaims::issue("svc-a", Duration::hours(1)).unwrap()).unwrap();

        let app = gate
            .admit::<AppClaims>(Endpoint::Auth, &headers(&format!("Bearer {}", token)))
            .unwrap();
        assert_eq!(app.client(), "svc-a");
    }

    #[test]
    fn test_admit_rejects_other_tiers_uniformly() {
        let (gate, signer) = gate_and_signer();
        let auth = signer.sign(&AuthClaims::issue("svc-a", Duration::hours(1)).unwrap()).unwrap();
        let rpc = signer
            .sign(&RpcClaims::issue("svc-a", "Billing", "Charge", Duration::minutes(5)).unwrap())
            .unwrap();

        let mut messages = Vec::new();
        for value in [
            format!("Bearer {}", auth),
            format!("Bearer {}", rpc),
            "Bearer garbage".to_string(),
            "Basic abc".to_string(),
        ] {
            let err = gate
                .admit::<AppClaims>(Endpoint::Auth, &headers(&value))
                .unwrap_err();
            assert_eq!(err.code(), Code::Unauthenticated);
            messages.push(err.message().to_string());
        }
        messages.dedup();
        assert_eq!(messages.len(), 1);
    }

    #[test]
    fn test_admit_missing_credential() {
        let (gate, _) = gate_and_signer();
        let err = gate
            .admit::<AuthClaims>(Endpoint::GetToken, &HeaderMap::new())
            .unwrap_err();
        assert_eq!(err.code(), Code::Unauthenticated);
    }

    #[test]
    fn test_admit_miswired_endpoint_is_internal() {
        let (gate, signer) = gate_and_signer();
        let token = signer.sign(&AppClaims::issue("svc-a", Duration::hours(1)).unwrap()).unwrap();

        let err = gate
            .admit::<AppClaims>(Endpoint::GetToken, &headers(&format!("Bearer {}", token)))
            .unwrap_err();
        assert_eq!(err.code(), Code::Internal);

        let err = gate
            .admit::<AppClaims>(Endpoint::SigningKey, &headers(&format!("Bearer {}", token)))
            .unwrap_err();
        assert_eq!(err.code(), Code::Internal);
    }
}
