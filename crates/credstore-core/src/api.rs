//! Request and reply bodies of the CredStore RPC surface.
//!
//! Shared by the server and the client so both sides agree on the wire format.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Route of the signing key query.
pub const SIGNING_KEY_PATH: &str = "/credstore.CredStoreAuth/SigningKey";

/// Route of the session token exchange.
pub const AUTH_PATH: &str = "/credstore.CredStoreAuth/Auth";

/// Route of the per-call token exchange.
pub const GET_TOKEN_PATH: &str = "/credstore.CredStore/GetToken";

/// Request for the server's current signing key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SigningKeyRequest {}

/// The server's public key, base64 of its SPKI DER encoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SigningKeyReply {
    pub signing_key: String,
}

/// Session-token exchange. The app token travels as the bearer credential.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthRequest {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthReply {
    pub auth_jwt: String,
}

/// Per-call token exchange. The auth token travels as the bearer credential.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GetTokenRequest {
    /// Destination system, matched against authorization `via` entries.
    pub target: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetTokenReply {
    pub session_jwt: String,
}

/// Failure kinds reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Code {
    Unauthenticated,
    PermissionDenied,
    InvalidArgument,
    Internal,
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Code::Unauthenticated => "unauthenticated",
            Code::PermissionDenied => "permission_denied",
            Code::InvalidArgument => "invalid_argument",
            Code::Internal => "internal",
        };
        f.write_str(s)
    }
}

/// Body of every non-success reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: Code,
    pub message: String,
}
