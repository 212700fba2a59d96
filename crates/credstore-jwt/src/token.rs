//! Token signing and verification.
//!
//! Tokens are compact JWS (`header.payload.signature`) signed with EdDSA. The
//! payload is a [`Claims`] value tagged with its tier.

use crate::claims::{Claims, TierClaims};
use crate::error::{ClaimError, JwtError};
use crate::keys::KeyPair;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use ed25519_dalek::VerifyingKey;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::ops::Deref;

/// Signs claim sets into compact tokens.
pub struct TokenSigner {
    header: Header,
    encoding_key: EncodingKey,
}

impl TokenSigner {
    /// Create a new token signer with the given keypair.
    pub fn new(keypair: &KeyPair) -> Result<Self, JwtError> {
        let der = keypair.pkcs8_der()?;
        let mut header = Header::new(Algorithm::EdDSA);
        header.typ = Some("JWT".to_string());

        Ok(Self {
            header,
            encoding_key: EncodingKey::from_ed_der(&der),
        })
    }

    /// Sign a claim set of any tier.
    pub fn sign<C: TierClaims>(&self, claims: &C) -> Result<String, JwtError> {
        let payload: Claims = claims.clone().into();
        jsonwebtoken::encode(&self.header, &payload, &self.encoding_key)
            .map_err(|e| JwtError::SigningFailed(e.to_string()))
    }
}

/// Verifier for CredStore tokens.
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    /// Create a new token verifier with the given public key.
    pub fn new(public_key: &VerifyingKey) -> Result<Self, JwtError> {
        let x = URL_SAFE_NO_PAD.encode(public_key.as_bytes());
        let decoding_key = DecodingKey::from_ed_components(&x)
            .map_err(|e| JwtError::InvalidPublicKey(e.to_string()))?;

        // Expiry is checked by the claim model with a strict `now < exp`.
        let mut validation = Validation::new(Algorithm::EdDSA);
        validation.leeway = 0;
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp"]);

        Ok(Self {
            decoding_key,
            validation,
        })
    }

    /// Verify a token of tier `C` against the current time.
    pub fn verify<C: TierClaims>(&self, token: &str) -> Result<Verified<C>, JwtError> {
        self.verify_at(token, Utc::now().timestamp())
    }

    /// Verify a token of tier `C` against an explicit `now` (Unix seconds).
    pub fn verify_at<C: TierClaims>(&self, token: &str, now: i64) -> Result<Verified<C>, JwtError> {
        let claims = self.decode(token)?;
        let claims = C::from_claims(claims).map_err(|actual| ClaimError::WrongTier {
            expected: C::TIER,
            actual,
        })?;
        claims.validate_at(now)?;

        Ok(Verified { claims })
    }

    fn decode(&self, token: &str) -> Result<Claims, JwtError> {
        let data =
            jsonwebtoken::decode::<Claims>(token.trim(), &self.decoding_key, &self.validation)?;
        Ok(data.claims)
    }
}

/// A claim set whose signature, tier and validity window have been checked.
///
/// Only [`TokenVerifier`] constructs this type, so holding a `Verified<C>` is
/// proof that a token of tier `C` was presented.
#[derive(Debug, Clone)]
pub struct Verified<C> {
    claims: C,
}

impl<C> Verified<C> {
    /// The verified claims.
    pub fn claims(&self) -> &C {
        &self.claims
    }

    /// Unwrap the verified claims.
    pub fn into_inner(self) -> C {
        self.claims
    }
}

impl<C> Deref for Verified<C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.claims
    }
}

/// Inspect a token without verification (for debugging).
pub fn inspect_token_unverified(token: &str) -> Result<TokenInfo, JwtError> {
    let header = jsonwebtoken::decode_header(token.trim())?;
    let payload = token
        .trim()
        .split('.')
        .nth(1)
        .ok_or_else(|| JwtError::MalformedToken("missing payload segment".to_string()))?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| JwtError::MalformedToken(e.to_string()))?;
    let claims: Claims =
        serde_json::from_slice(&bytes).map_err(|e| JwtError::MalformedToken(e.to_string()))?;

    Ok(TokenInfo {
        algorithm: format!("{:?}", header.alg),
        claims,
    })
}

/// Re-encode a compact token in the flattened JWS JSON serialization.
///
/// The segments are carried over unchanged, so the signature still covers
/// the same protected header and payload.
pub fn json_serialization(token: &str) -> Result<String, JwtError> {
    let mut segments = token.trim().split('.');
    let (Some(protected), Some(payload), Some(signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(JwtError::MalformedToken(
            "expected three dot-separated segments".to_string(),
        ));
    };

    let json = serde_json::json!({
        "payload": payload,
        "protected": protected,
        "signature": signature,
    });
    Ok(json.to_string())
}

/// Information about a token (for inspection).
#[derive(Debug)]
pub struct TokenInfo {
    /// Signing algorithm named in the header.
    pub algorithm: String,
    /// Decoded, unverified claims.
    pub claims: Claims,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claims::{AppClaims, AuthClaims, RpcClaims, Tier};
    use chrono::Duration;

    fn signer_and_verifier() -> (TokenSigner, TokenVerifier) {
        let keypair = KeyPair::generate();
        let signer = TokenSigner::new(&keypair).unwrap();
        let verifier = TokenVerifier::new(&keypair.public_key()).unwrap();
        (signer, verifier)
    }

    #[test]
    fn test_sign_and_verify_each_tier() {
        let (signer, verifier) = signer_and_verifier();

        let app = AppClaims::issue("svc-a", Duration::days(365)).unwrap();
        let token = signer.sign(&app).unwrap();
        assert_eq!(verifier.verify::<AppClaims>(&token).unwrap().into_inner(), app);

        let auth = AuthClaims::issue("svc-a", Duration::hours(1)).unwrap();
        let token = signer.sign(&auth).unwrap();
        assert_eq!(verifier.verify::<AuthClaims>(&token).unwrap().into_inner(), auth);

        let rpc = RpcClaims::issue("svc-a", "Billing", "Charge", Duration::minutes(5)).unwrap();
        let token = signer.sign(&rpc).unwrap();
        let verified = verifier.verify::<RpcClaims>(&token).unwrap();
        assert_eq!(verified.service(), "Billing");
        assert_eq!(verified.into_inner(), rpc);
    }

    #[test]
    fn test_token_is_compact_jws() {
        let (signer, _) = signer_and_verifier();
        let token = signer.sign(&AppClaims::issue("svc-a", Duration::hours(1)).unwrap()).unwrap();
        assert_eq!(token.split('.').count(), 3);

        let info = inspect_token_unverified(&token).unwrap();
        assert_eq!(info.algorithm, "EdDSA");
        assert_eq!(info.claims.tier(), Tier::App);
        assert_eq!(info.claims.client(), "svc-a");
    }

    #[test]
    fn test_wrong_tier_is_rejected() {
        let (signer, verifier) = signer_and_verifier();
        let token = signer.sign(&AppClaims::issue("svc-a", Duration::hours(1)).unwrap()).unwrap();

        let err = verifier.verify::<AuthClaims>(&token).unwrap_err();
        assert!(matches!(
            err,
            JwtError::Claim(ClaimError::WrongTier {
                expected: Tier::Auth,
                actual: Tier::App
            })
        ));
    }

    #[test]
    fn test_expiry_boundary() {
        let (signer, verifier) = signer_and_verifier();
        let now = Utc::now().timestamp();

        let token = signer.sign(&AuthClaims::new("svc-a", now - 60, now)).unwrap();
        let err = verifier.verify_at::<AuthClaims>(&token, now).unwrap_err();
        assert!(matches!(err, JwtError::Claim(ClaimError::Expired { .. })));

        let token = signer.sign(&AuthClaims::new("svc-a", now - 60, now + 1)).unwrap();
        assert!(verifier.verify_at::<AuthClaims>(&token, now).is_ok());
    }

    #[test]
    fn test_wrong_key_is_rejected() {
        let (signer, _) = signer_and_verifier();
        let (_, other_verifier) = signer_and_verifier();
        let token = signer.sign(&AppClaims::issue("svc-a", Duration::hours(1)).unwrap()).unwrap();

        let err = other_verifier.verify::<AppClaims>(&token).unwrap_err();
        assert!(matches!(err, JwtError::VerificationFailed(_)));
    }

    #[test]
    fn test_single_character_tampering_is_rejected() {
        let (signer, verifier) = signer_and_verifier();
        let token = signer
            .sign(&RpcClaims::issue("svc-a", "Billing", "Charge", Duration::minutes(5)).unwrap())
            .unwrap();
        let payload_start = token.find('.').unwrap() + 1;

        for i in payload_start..token.len() {
            let original = token.as_bytes()[i];
            if original == b'.' {
                continue;
            }
            let replacement = if original == b'A' { 'B' } else { 'A' };
            let mut tampered = token.clone();
            tampered.replace_range(i..i + 1, &replacement.to_string());

            assert!(
                verifier.verify::<RpcClaims>(&tampered).is_err(),
                "tampering at offset {} was accepted",
                i
            );
        }
    }

    #[test]
    fn test_garbage_is_malformed() {
        let (_, verifier) = signer_and_verifier();
        let err = verifier.verify::<AppClaims>("not-a-token").unwrap_err();
        assert!(matches!(err, JwtError::MalformedToken(_)));
    }

    #[test]
    fn test_structurally_invalid_claims_are_rejected_after_signing() {
        let (signer, verifier) = signer_and_verifier();
        let now = Utc::now().timestamp();
        let token = signer.sign(&AppClaims::new("", now, now + 60)).unwrap();

        let err = verifier.verify::<AppClaims>(&token).unwrap_err();
        assert!(matches!(err, JwtError::Claim(ClaimError::Malformed(_))));
    }

    #[test]
    fn test_json_serialization_keeps_segments() {
        let (signer, verifier) = signer_and_verifier();
        let token = signer
            .sign(&RpcClaims::issue("svc-a", "Billing", "Charge", Duration::minutes(5)).unwrap())
            .unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&json_serialization(&token).unwrap()).unwrap();
        let rebuilt = format!(
            "{}.{}.{}",
            json["protected"].as_str().unwrap(),
            json["payload"].as_str().unwrap(),
            json["signature"].as_str().unwrap()
        );
        assert_eq!(rebuilt, token);
        assert!(verifier.verify::<RpcClaims>(&rebuilt).is_ok());

        assert!(json_serialization("a.b").is_err());
        assert!(json_serialization("a.b.c.d").is_err());
    }
}
