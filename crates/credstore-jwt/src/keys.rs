//! Keypair management for token signing.
//!
//! Private keys are stored as PKCS#8 PEM, public keys as SPKI PEM. The public
//! key is exported to clients as SPKI DER.

use crate::error::JwtError;
use ed25519_dalek::pkcs8::spki::der::pem::LineEnding;
use ed25519_dalek::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use ed25519_dalek::{SigningKey, VerifyingKey};
use rand::RngCore;
use std::fmt;
use std::path::Path;

/// An Ed25519 keypair for signing and verifying tokens.
#[derive(Clone)]
pub struct KeyPair {
    inner: SigningKey,
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.inner.verifying_key())
            .finish_non_exhaustive()
    }
}

impl KeyPair {
    /// Generate a new random keypair.
    pub fn generate() -> Self {
        let mut seed = [0u8; 32];
        rand::rng().fill_bytes(&mut seed);
        Self {
            inner: SigningKey::from_bytes(&seed),
        }
    }

    /// Load a keypair from a PKCS#8 PEM private key.
    pub fn from_pkcs8_pem(pem: &str) -> Result<Self, JwtError> {
        let inner = SigningKey::from_pkcs8_pem(pem.trim())
            .map_err(|e| JwtError::InvalidPrivateKey(e.to_string()))?;
        Ok(Self { inner })
    }

    /// Load a keypair from a private key file.
    pub fn load_from_file(private_key_path: &Path) -> Result<Self, JwtError> {
        let pem = std::fs::read_to_string(private_key_path)?;
        let keypair = Self::from_pkcs8_pem(&pem)?;
        tracing::debug!(path = %private_key_path.display(), "loaded signing key");
        Ok(keypair)
    }

    /// Get the public key.
    pub fn public_key(&self) -> VerifyingKey {
        self.inner.verifying_key()
    }

    /// Get the private key as PKCS#8 PEM.
    pub fn private_key_pem(&self) -> Result<String, JwtError> {
        let pem = self
            .inner
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| JwtError::KeyEncodingFailed(e.to_string()))?;
        Ok(pem.as_str().to_owned())
    }

    /// Get the public key as SPKI PEM.
    pub fn public_key_pem(&self) -> Result<String, JwtError> {
        public_key_pem(&self.public_key())
    }

    /// Get the public key as SPKI DER.
    pub fn public_key_der(&self) -> Result<Vec<u8>, JwtError> {
        public_key_der(&self.public_key())
    }

    /// PKCS#8 DER of the private key, as consumed by the JWS encoder.
    pub(crate) fn pkcs8_der(&self) -> Result<Vec<u8>, JwtError> {
        let der = self
            .inner
            .to_pkcs8_der()
            .map_err(|e| JwtError::KeyEncodingFailed(e.to_string()))?;
        Ok(der.as_bytes().to_vec())
    }

    /// Save the keypair to files.
    pub fn save_to_files(
        &self,
        private_key_path: &Path,
        public_key_path: &Path,
    ) -> Result<(), JwtError> {
        std::fs::write(private_key_path, self.private_key_pem()?)?;
        std::fs::write(public_key_path, self.public_key_pem()?)?;
        Ok(())
    }
}

/// Encode a public key as SPKI PEM.
pub fn public_key_pem(key: &VerifyingKey) -> Result<String, JwtError> {
    key.to_public_key_pem(LineEnding::LF)
        .map_err(|e| JwtError::KeyEncodingFailed(e.to_string()))
}

/// Encode a public key as SPKI DER.
pub fn public_key_der(key: &VerifyingKey) -> Result<Vec<u8>, JwtError> {
    let der = key
        .to_public_key_der()
        .map_err(|e| JwtError::KeyEncodingFailed(e.to_string()))?;
    Ok(der.as_bytes().to_vec())
}

/// Load a public key from SPKI PEM (for verification-only scenarios).
pub fn load_public_key_pem(pem: &str) -> Result<VerifyingKey, JwtError> {
    VerifyingKey::from_public_key_pem(pem.trim())
        .map_err(|e| JwtError::InvalidPublicKey(e.to_string()))
}

/// Load a public key from SPKI DER, as returned by the signing key query.
pub fn load_public_key_der(der: &[u8]) -> Result<VerifyingKey, JwtError> {
    VerifyingKey::from_public_key_der(der).map_err(|e| JwtError::InvalidPublicKey(e.to_string()))
}

/// Load a public key from a file.
pub fn load_public_key_file(path: &Path) -> Result<VerifyingKey, JwtError> {
    let pem = std::fs::read_to_string(path)?;
    load_public_key_pem(&pem)
}
