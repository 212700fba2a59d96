//! Token management commands.
//!
//! `credstore token mint` - Mint an app token offline.
//! `credstore token inspect` - Decode a token without verifying it.
//! `credstore token verify` - Verify a token against a public key.

use anyhow::Context;
use chrono::DateTime;
use credstore_jwt::keys::load_public_key_file;
use credstore_jwt::{
    AppClaims, AuthClaims, Claims, JwtError, KeyPair, RpcClaims, Tier, TokenSigner,
    TokenVerifier, check_lifetime, inspect_token_unverified, json_serialization,
};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_APP_TOKEN_LIFETIME: &str = "8760h";

/// Read a token from a file if `token` names one, else use it verbatim.
fn resolve_token(token: String) -> anyhow::Result<String> {
    if Path::new(&token).is_file() {
        let contents = fs::read_to_string(&token)
            .with_context(|| format!("Failed to read token file: {}", token))?;
        Ok(contents.trim().to_string())
    } else {
        Ok(token.trim().to_string())
    }
}

fn parse_lifetime(s: &str) -> anyhow::Result<chrono::Duration> {
    let lifetime =
        humantime::parse_duration(s).with_context(|| format!("Invalid duration: {:?}", s))?;
    let lifetime = chrono::Duration::from_std(lifetime).context("Duration is out of range")?;
    check_lifetime(lifetime).with_context(|| {
        format!(
            "Duration {:?} must be positive and at most {} days",
            s,
            credstore_jwt::max_lifetime().num_days()
        )
    })
}

fn format_time(unix: i64) -> String {
    DateTime::from_timestamp(unix, 0)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| unix.to_string())
}

fn print_claims(claims: &Claims) {
    println!("  Tier:    {}", claims.tier());
    println!("  Client:  {}", claims.client());
    if let Some((service, method)) = claims.rpc_scope() {
        println!("  Service: {}", service);
        println!("  Method:  {}", method);
    }
    println!("  Issued:  {}", format_time(claims.issued_at()));
    println!("  Expires: {}", format_time(claims.expires_at()));
}

/// Sign an app token for `client`.
pub fn mint_app_token(
    keypair: &KeyPair,
    client: &str,
    lifetime: chrono::Duration,
) -> anyhow::Result<String> {
    if client.trim().is_empty() {
        anyhow::bail!("Client name not specified");
    }
    let signer = TokenSigner::new(keypair)?;
    let claims = AppClaims::issue(client, lifetime)?;
    Ok(signer.sign(&claims)?)
}

/// Mint an app token offline from the server's signing key.
///
/// With `long`, the token is written in the JWS JSON serialization instead of
/// the compact form.
pub fn mint(
    signing_key: PathBuf,
    client: String,
    expires: String,
    long: bool,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let keypair = KeyPair::load_from_file(&signing_key).with_context(|| {
        format!("Failed to load signing key from file: {}", signing_key.display())
    })?;
    let lifetime = parse_lifetime(&expires)?;
    let mut token = mint_app_token(&keypair, &client, lifetime)?;
    if long {
        token = json_serialization(&token)?;
    }

    if let Some(output_path) = output {
        fs::write(&output_path, &token)?;
        println!("✔ Token written to: {}", output_path.display());
        println!("  Client: {}", client);
        println!("  Expires in: {}", expires);
        println!();
        println!("Provide it to the client as CREDSTORE_APP_TOKEN.");
    } else {
        println!("{}", token);
    }

    Ok(())
}

/// Inspect a token without verification.
pub fn inspect(token: String) -> anyhow::Result<()> {
    let token = resolve_token(token)?;
    let info = inspect_token_unverified(&token)?;

    println!("Token Information (unverified):");
    println!("  Algorithm: {}", info.algorithm);
    print_claims(&info.claims);

    Ok(())
}

/// Verify a token of the given tier.
pub fn verify_token(
    verifier: &TokenVerifier,
    token: &str,
    tier: Tier,
) -> Result<Claims, JwtError> {
    match tier {
        Tier::App => verifier.verify::<AppClaims>(token).map(|v| v.into_inner().into()),
        Tier::Auth => verifier.verify::<AuthClaims>(token).map(|v| v.into_inner().into()),
        Tier::Rpc => verifier.verify::<RpcClaims>(token).map(|v| v.into_inner().into()),
    }
}

/// Verify a token against a public key file.
pub fn verify(public_key: PathBuf, tier: Tier, token: String) -> anyhow::Result<()> {
    let public_key = load_public_key_file(&public_key).with_context(|| {
        format!("Failed to load public key from file: {}", public_key.display())
    })?;
    let verifier = TokenVerifier::new(&public_key)?;
    let token = resolve_token(token)?;

    let claims = verify_token(&verifier, &token, tier)
        .map_err(|e| anyhow::anyhow!("✖ Token verification failed: {}", e))?;

    println!("✔ Token is valid");
    println!();
    println!("Token Details:");
    print_claims(&claims);

    Ok(())
}
