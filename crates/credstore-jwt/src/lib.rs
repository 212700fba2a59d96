//! # credstore-jwt
//!
//! Claim model and token signing for CredStore.
//!
//! This crate provides functionality for:
//! - Generating Ed25519 keypairs for token signing
//! - The claim schemas of the three token tiers and their structural rules
//! - Signing claims into compact JWTs and verifying them back
//!
//! ## Three-Tier Token Model
//!
//! | Tier | Created By | Contains | Lifetime |
//! |------|------------|----------|----------|
//! | **App** | Operator (`credstore token mint`) | Client identity | Long-lived |
//! | **Auth** | Server, from a verified App token | Client identity | Short-lived |
//! | **RPC** | Server, from a verified Auth token | Client + service + method | Short-lived |
//!
//! A token of one tier is never accepted where another tier is expected: the
//! tier is part of the signed payload and checked by [`TokenVerifier`].

pub mod claims;
pub mod error;
pub mod keys;
pub mod token;

pub use claims::{
    AppClaims, AuthClaims, Claims, RpcClaims, Tier, TierClaims, check_lifetime, max_lifetime,
};
pub use ed25519_dalek::VerifyingKey as PublicKey;
pub use error::{ClaimError, JwtError};
pub use keys::KeyPair;
pub use token::{
    TokenInfo, TokenSigner, TokenVerifier, Verified, inspect_token_unverified, json_serialization,
};
