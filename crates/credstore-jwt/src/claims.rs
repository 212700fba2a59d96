//! Token claims for the App, Auth and RPC tiers.
//!
//! Timestamps are Unix seconds. A claim is valid while `now < exp`; a claim
//! whose `exp` equals the current second is already expired.

use crate::error::ClaimError;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Token tier. Escalation always moves one step: App -> Auth -> RPC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    App,
    Auth,
    Rpc,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::App => write!(f, "app"),
            Tier::Auth => write!(f, "auth"),
            Tier::Rpc => write!(f, "rpc"),
        }
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "app" => Ok(Tier::App),
            "auth" => Ok(Tier::Auth),
            "rpc" => Ok(Tier::Rpc),
            other => Err(format!("unknown token tier '{}'", other)),
        }
    }
}

/// Claims of the static, out-of-band provisioned app token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppClaims {
    client: String,
    #[serde(rename = "iat")]
    issued_at: i64,
    #[serde(rename = "exp")]
    expires_at: i64,
}

/// Claims of a session token: "this client presented a valid app token".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthClaims {
    client: String,
    #[serde(rename = "iat")]
    issued_at: i64,
    #[serde(rename = "exp")]
    expires_at: i64,
}

/// Claims of a per-call token scoped to one `service.method`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcClaims {
    client: String,
    service: String,
    method: String,
    #[serde(rename = "iat")]
    issued_at: i64,
    #[serde(rename = "exp")]
    expires_at: i64,
}

/// The signed payload of any token, tagged by tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tier", rename_all = "lowercase")]
pub enum Claims {
    App(AppClaims),
    Auth(AuthClaims),
    Rpc(RpcClaims),
}

impl AppClaims {
    /// Create app claims with an explicit validity window.
    pub fn new(client: impl Into<String>, issued_at: i64, expires_at: i64) -> Self {
        Self {
            client: client.into(),
            issued_at,
            expires_at,
        }
    }

    /// Create app claims valid from now for `lifetime`.
    pub fn issue(client: impl Into<String>, lifetime: Duration) -> Result<Self, ClaimError> {
        let (issued_at, expires_at) = window_from_now(lifetime)?;
        Ok(Self::new(client, issued_at, expires_at))
    }
}

impl AuthClaims {
    /// Create auth claims with an explicit validity window.
    pub fn new(client: impl Into<String>, issued_at: i64, expires_at: i64) -> Self {
        Self {
            client: client.into(),
            issued_at,
            expires_at,
        }
    }

    /// Create auth claims valid from now for `lifetime`.
    pub fn issue(client: impl Into<String>, lifetime: Duration) -> Result<Self, ClaimError> {
        let (issued_at, expires_at) = window_from_now(lifetime)?;
        Ok(Self::new(client, issued_at, expires_at))
    }
}

impl RpcClaims {
    /// Create RPC claims with an explicit validity window.
    pub fn new(
        client: impl Into<String>,
        service: impl Into<String>,
        method: impl Into<String>,
        issued_at: i64,
        expires_at: i64,
    ) -> Self {
        Self {
            client: client.into(),
            service: service.into(),
            method: method.into(),
            issued_at,
            expires_at,
        }
    }

    /// Create RPC claims valid from now for `lifetime`.
    pub fn issue(
        client: impl Into<String>,
        service: impl Into<String>,
        method: impl Into<String>,
        lifetime: Duration,
    ) -> Result<Self, ClaimError> {
        let (issued_at, expires_at) = window_from_now(lifetime)?;
        Ok(Self::new(client, service, method, issued_at, expires_at))
    }

    /// The RPC service this token authorizes.
    pub fn service(&self) -> &str {
        &self.service
    }

    /// The RPC method this token authorizes.
    pub fn method(&self) -> &str {
        &self.method
    }
}

/// Behaviour shared by the claim types of every tier.
pub trait TierClaims: Clone + Into<Claims> {
    /// The tier this claim type belongs to.
    const TIER: Tier;

    /// Client identity.
    fn client(&self) -> &str;

    /// Issuance time, Unix seconds.
    fn issued_at(&self) -> i64;

    /// Expiry time, Unix seconds.
    fn expires_at(&self) -> i64;

    /// Narrow a decoded claim set to this tier; returns the actual tier on mismatch.
    fn from_claims(claims: Claims) -> Result<Self, Tier>;

    /// Tier-specific required fields.
    fn check_fields(&self) -> Result<(), ClaimError> {
        Ok(())
    }

    /// Check required fields, the validity window and expiry against `now`.
    fn validate_at(&self, now: i64) -> Result<(), ClaimError> {
        if self.client().trim().is_empty() {
            return Err(ClaimError::Malformed("missing client".to_string()));
        }
        if self.expires_at() <= self.issued_at() {
            return Err(ClaimError::Malformed(format!(
                "exp {} is not after iat {}",
                self.expires_at(),
                self.issued_at()
            )));
        }
        self.check_fields()?;
        if now >= self.expires_at() {
            return Err(ClaimError::Expired {
                expires_at: self.expires_at(),
            });
        }
        Ok(())
    }
}

impl TierClaims for AppClaims {
    const TIER: Tier = Tier::App;

    fn client(&self) -> &str {
        &self.client
    }

    fn issued_at(&self) -> i64 {
        self.issued_at
    }

    fn expires_at(&self) -> i64 {
        self.expires_at
    }

    fn from_claims(claims: Claims) -> Result<Self, Tier> {
        match claims {
            Claims::App(c) => Ok(c),
            other => Err(other.tier()),
        }
    }
}

impl TierClaims for AuthClaims {
    const TIER: Tier = Tier::Auth;

    fn client(&self) -> &str {
        &self.client
    }

    fn issued_at(&self) -> i64 {
        self.issued_at
    }

    fn expires_at(&self) -> i64 {
        self.expires_at
    }

    fn from_claims(claims: Claims) -> Result<Self, Tier> {
        match claims {
            Claims::Auth(c) => Ok(c),
            other => Err(other.tier()),
        }
    }
}

impl TierClaims for RpcClaims {
    const TIER: Tier = Tier::Rpc;

    fn client(&self) -> &str {
        &self.client
    }

    fn issued_at(&self) -> i64 {
        self.issued_at
    }

    fn expires_at(&self) -> i64 {
        self.expires_at
    }

    fn from_claims(claims: Claims) -> Result<Self, Tier> {
        match claims {
            Claims::Rpc(c) => Ok(c),
            other => Err(other.tier()),
        }
    }

    fn check_fields(&self) -> Result<(), ClaimError> {
        if self.service.trim().is_empty() {
            return Err(ClaimError::Malformed("missing service".to_string()));
        }
        if self.method.trim().is_empty() {
            return Err(ClaimError::Malformed("missing method".to_string()));
        }
        Ok(())
    }
}

impl From<AppClaims> for Claims {
    fn from(claims: AppClaims) -> Self {
        Claims::App(claims)
    }
}

impl From<AuthClaims> for Claims {
    fn from(claims: AuthClaims) -> Self {
        Claims::Auth(claims)
    }
}

impl From<RpcClaims> for Claims {
    fn from(claims: RpcClaims) -> Self {
        Claims::Rpc(claims)
    }
}

impl Claims {
    /// The tier tag of this claim set.
    pub fn tier(&self) -> Tier {
        match self {
            Claims::App(_) => Tier::App,
            Claims::Auth(_) => Tier::Auth,
            Claims::Rpc(_) => Tier::Rpc,
        }
    }

    /// Client identity, whatever the tier.
    pub fn client(&self) -> &str {
        match self {
            Claims::App(c) => c.client(),
            Claims::Auth(c) => c.client(),
            Claims::Rpc(c) => c.client(),
        }
    }

    pub fn issued_at(&self) -> i64 {
        match self {
            Claims::App(c) => c.issued_at(),
            Claims::Auth(c) => c.issued_at(),
            Claims::Rpc(c) => c.issued_at(),
        }
    }

    pub fn expires_at(&self) -> i64 {
        match self {
            Claims::App(c) => c.expires_at(),
            Claims::Auth(c) => c.expires_at(),
            Claims::Rpc(c) => c.expires_at(),
        }
    }

    /// `(service, method)` for RPC claims.
    pub fn rpc_scope(&self) -> Option<(&str, &str)> {
        match self {
            Claims::Rpc(c) => Some((c.service(), c.method())),
            _ => None,
        }
    }

    /// Validate with the rules of the claim's own tier.
    pub fn validate_at(&self, now: i64) -> Result<(), ClaimError> {
        match self {
            Claims::App(c) => c.validate_at(now),
            Claims::Auth(c) => c.validate_at(now),
            Claims::Rpc(c) => c.validate_at(now),
        }
    }
}

/// Longest lifetime any token may be issued with.
pub fn max_lifetime() -> Duration {
    Duration::days(MAX_LIFETIME_DAYS)
}

const MAX_LIFETIME_DAYS: i64 = 100 * 365;

/// Check that `lifetime` is positive and no longer than [`max_lifetime`].
pub fn check_lifetime(lifetime: Duration) -> Result<Duration, ClaimError> {
    if lifetime <= Duration::zero() || lifetime > max_lifetime() {
        return Err(ClaimError::LifetimeOutOfRange(lifetime.num_seconds()));
    }
    Ok(lifetime)
}

fn window_from_now(lifetime: Duration) -> Result<(i64, i64), ClaimError> {
    let lifetime = check_lifetime(lifetime)?;
    let now = Utc::now();
    let expires = now
        .checked_add_signed(lifetime)
        .ok_or(ClaimError::LifetimeOutOfRange(lifetime.num_seconds()))?;
    Ok((now.timestamp(), expires.timestamp()))
}
