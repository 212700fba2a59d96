//! Axum handlers: admit the caller through the gate, then hand the verified
//! claims to the service.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::HeaderMap;
use credstore_core::api::{AuthReply, GetTokenReply, GetTokenRequest, SigningKeyReply};
use credstore_jwt::{AppClaims, AuthClaims};
use serde_json::json;
use std::sync::Arc;

use super::gate::Endpoint;
use crate::error::Status;
use crate::state::AppState;

pub async fn signing_key(State(state): State<Arc<AppState>>) -> Json<SigningKeyReply> {
    Json(state.auth.signing_key())
}

pub async fn auth(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<AuthReply>, Status> {
    let app = state.gate.admit::<AppClaims>(Endpoint::Auth, &headers)?;
    state.auth.auth(app).map(Json)
}

pub async fn get_token(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<GetTokenRequest>, JsonRejection>,
) -> Result<Json<GetTokenReply>, Status> {
    let auth = state.gate.admit::<AuthClaims>(Endpoint::GetToken, &headers)?;
    let Json(request) =
        body.map_err(|err| Status::invalid_argument(format!("malformed request: {}", err)))?;
    state.credstore.get_token(auth, request).map(Json)
}

pub async fn healthz() -> Json<serde_json::Value> {
    Json(json!({ "ok": true, "service": "credstore-server" }))
}
