//! Error types for the JWT crate.

use crate::claims::Tier;
use thiserror::Error;

/// Errors that can occur during token signing and verification.
#[derive(Debug, Error)]
pub enum JwtError {
    /// Failed to parse private key.
    #[error("failed to parse private key: {0}")]
    InvalidPrivateKey(String),

    /// Failed to parse public key.
    #[error("failed to parse public key: {0}")]
    InvalidPublicKey(String),

    /// Failed to encode key material.
    #[error("failed to encode key: {0}")]
    KeyEncodingFailed(String),

    /// Failed to sign a claim set.
    #[error("failed to sign token: {0}")]
    SigningFailed(String),

    /// Signature or algorithm did not check out.
    #[error("token verification failed: {0}")]
    VerificationFailed(String),

    /// Token could not be decoded into a claim set.
    #[error("malformed token: {0}")]
    MalformedToken(String),

    /// Claim set decoded but is structurally invalid or expired.
    #[error(transparent)]
    Claim(#[from] ClaimError),

    /// IO error (reading/writing keys).
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Structural problems with a decoded claim set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClaimError {
    /// A required field is missing, empty or inconsistent.
    #[error("malformed claim: {0}")]
    Malformed(String),

    /// The claim's validity window has ended.
    #[error("token expired at {expires_at}")]
    Expired { expires_at: i64 },

    /// The token belongs to a different tier than the one required.
    #[error("expected {expected} token, got {actual} token")]
    WrongTier { expected: Tier, actual: Tier },

    /// A token lifetime is not positive or exceeds the supported maximum.
    #[error("token lifetime of {0}s is out of range")]
    LifetimeOutOfRange(i64),
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::InvalidSignature
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::InvalidAlgorithmName
            | ErrorKind::InvalidKeyFormat => JwtError::VerificationFailed(err.to_string()),
            ErrorKind::InvalidEcdsaKey | ErrorKind::InvalidRsaKey(_) => {
                JwtError::InvalidPublicKey(err.to_string())
            }
            _ => JwtError::MalformedToken(err.to_string()),
        }
    }
}
