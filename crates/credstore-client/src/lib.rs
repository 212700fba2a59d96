//! # credstore-client
//!
//! Async client for CredStore. A process holds one long-lived app token
//! (usually from `$CREDSTORE_APP_TOKEN`), exchanges it for an auth token, then
//! asks for a short-lived RPC token per destination.
//!
//! ```no_run
//! # async fn run() -> Result<(), credstore_client::ClientError> {
//! use credstore_client::{CredStoreClient, app_token_from_env};
//!
//! let client = CredStoreClient::new("http://credstore.internal:8008");
//! let auth = client.auth_token(&app_token_from_env()?).await?;
//! let rpc = client.get_token(&auth, "billing.internal").await?;
//! # let _ = rpc;
//! # Ok(())
//! # }
//! ```

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use credstore_core::api::{
    self, AuthReply, AuthRequest, Code, ErrorBody, GetTokenReply, GetTokenRequest,
    SigningKeyReply, SigningKeyRequest,
};
use credstore_jwt::PublicKey;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Environment variable holding the process's app token.
pub const APP_TOKEN_ENV: &str = "CREDSTORE_APP_TOKEN";

/// Errors returned by the client.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("app token not present in ${}", APP_TOKEN_ENV)]
    MissingAppToken,

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server refused the call.
    #[error("{code}: {message}")]
    Status { code: Code, message: String },

    #[error("unexpected response (HTTP {status}): {body}")]
    UnexpectedResponse { status: u16, body: String },

    #[error("cannot parse the signing key: {0}")]
    InvalidSigningKey(String),
}

impl ClientError {
    /// The server-reported code, if the server answered with one.
    pub fn code(&self) -> Option<Code> {
        match self {
            ClientError::Status { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// The app token of the running process.
pub fn app_token_from_env() -> Result<String, ClientError> {
    match std::env::var(APP_TOKEN_ENV) {
        Ok(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
        _ => Err(ClientError::MissingAppToken),
    }
}

/// HTTP client for both CredStore services.
#[derive(Debug, Clone)]
pub struct CredStoreClient {
    base_url: String,
    http: reqwest::Client,
}

impl CredStoreClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_http_client(base_url, reqwest::Client::new())
    }

    pub fn with_http_client(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        }
    }

    /// Fetch the server's current token signing key.
    pub async fn signing_key(&self) -> Result<PublicKey, ClientError> {
        let reply: SigningKeyReply = self
            .call(api::SIGNING_KEY_PATH, None, &SigningKeyRequest {})
            .await?;
        let der = STANDARD
            .decode(reply.signing_key.as_bytes())
            .map_err(|e| ClientError::InvalidSigningKey(e.to_string()))?;
        credstore_jwt::keys::load_public_key_der(&der)
            .map_err(|e| ClientError::InvalidSigningKey(e.to_string()))
    }

    /// Exchange an app token for an auth token.
    pub async fn auth_token(&self, app_token: &str) -> Result<String, ClientError> {
        let reply: AuthReply = self
            .call(api::AUTH_PATH, Some(app_token), &AuthRequest {})
            .await?;
        Ok(reply.auth_jwt)
    }

    /// Exchange an auth token for an RPC token to call `target`.
    pub async fn get_token(&self, auth_token: &str, target: &str) -> Result<String, ClientError> {
        let request = GetTokenRequest {
            target: target.to_string(),
        };
        let reply: GetTokenReply = self
            .call(api::GET_TOKEN_PATH, Some(auth_token), &request)
            .await?;
        Ok(reply.session_jwt)
    }

    async fn call<Req, Resp>(
        &self,
        path: &str,
        bearer: Option<&str>,
        body: &Req,
    ) -> Result<Resp, ClientError>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.http.post(&url).json(body);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let text = response.text().await?;
        tracing::debug!(%url, status = status.as_u16(), "credstore call failed");
        match serde_json::from_str::<ErrorBody>(&text) {
            Ok(err) => Err(ClientError::Status {
                code: err.code,
                message: err.message,
            }),
            Err(_) => Err(ClientError::UnexpectedResponse {
                status: status.as_u16(),
                body: text,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};

    #[test]
    fn test_app_token_from_env() {
        unsafe {
            std::env::set_var(APP_TOKEN_ENV, " token-value\n");
        }
        assert_eq!(app_token_from_env().unwrap(), "token-value");

        unsafe {
            std::env::set_var(APP_TOKEN_ENV, "");
        }
        assert!(matches!(
            app_token_from_env(),
            Err(ClientError::MissingAppToken)
        ));

        unsafe {
            std::env::remove_var(APP_TOKEN_ENV);
        }
        assert!(matches!(
            app_token_from_env(),
            Err(ClientError::MissingAppToken)
        ));
    }

    #[test]
    fn test_base_url_is_normalized() {
        let client = CredStoreClient::new("http://localhost:8008/");
        assert_eq!(client.base_url, "http://localhost:8008");
    }

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_error_body_becomes_status() {
        let app = Router::new().route(
            api::GET_TOKEN_PATH,
            post(|| async {
                (
                    StatusCode::FORBIDDEN,
                    Json(ErrorBody {
                        code: Code::PermissionDenied,
                        message: "client svc-a doesn't have a scope for x".into(),
                    }),
                )
            }),
        );
        let client = CredStoreClient::new(serve(app).await);

        let err = client.get_token("tok", "x").await.unwrap_err();
        assert_eq!(err.code(), Some(Code::PermissionDenied));
        assert!(err.to_string().contains("svc-a"));
    }

    #[tokio::test]
    async fn test_non_json_error_is_unexpected() {
        let app = Router::new().route(
            api::AUTH_PATH,
            post(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }),
        );
        let client = CredStoreClient::new(serve(app).await);

        let err = client.auth_token("tok").await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::UnexpectedResponse { status: 502, .. }
        ));
    }
}
