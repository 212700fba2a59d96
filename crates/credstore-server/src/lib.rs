//! # credstore-server
//!
//! HTTP surface of CredStore. Two services share one signing key:
//!
//! - `credstore.CredStoreAuth`: `SigningKey` (open) and `Auth` (App token in,
//!   Auth token out)
//! - `credstore.CredStore`: `GetToken` (Auth token in, RPC token out)
//!
//! Every call is a `POST` with a JSON body. Bearer credentials travel in the
//! `authorization` header and are verified by the [`VerificationGate`] before
//! any handler logic runs.

pub mod auth;
pub mod config;
pub mod error;
pub mod middleware;
pub mod state;

use axum::Router;
use axum::routing::{get, post};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub use error::Status;
pub use middleware::{Endpoint, VerificationGate};
pub use state::AppState;

use middleware::handlers;

/// Build the router for all CredStore endpoints.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(Endpoint::SigningKey.path(), post(handlers::signing_key))
        .route(Endpoint::Auth.path(), post(handlers::auth))
        .route(Endpoint::GetToken.path(), post(handlers::get_token))
        .route("/healthz", get(handlers::healthz))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
