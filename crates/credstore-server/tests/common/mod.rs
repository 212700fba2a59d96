#![allow(dead_code)]

use chrono::Duration;
use credstore_core::PolicyConfig;
use credstore_jwt::{AppClaims, AuthClaims, KeyPair, TokenSigner, TokenVerifier};
use credstore_policy::PolicyEngine;
use credstore_server::auth::TokenLifetimes;
use credstore_server::{AppState, create_router};
use std::sync::Arc;

pub const POLICY: &str = r#"
scopes:
  - name: billing
    service: Billing
    method: Charge
  - name: reports
    service: Reports
    method: Export
clients:
  - svc-a
  - svc-b
authorizations:
  - client: svc-a
    scope: billing
    via: billing.internal
  - client: svc-b
    scope: reports
    via: reports.internal
  - client: svc-b
    scope: archive
    via: archive.internal
"#;

pub struct Harness {
    pub keypair: KeyPair,
    pub signer: TokenSigner,
    pub verifier: TokenVerifier,
    pub state: Arc<AppState>,
}

impl Harness {
    pub fn new() -> Self {
        let policy = PolicyConfig::from_yaml(POLICY).unwrap();
        let keypair = KeyPair::generate();
        let state = AppState::new(
            PolicyEngine::from_config_checked(policy).unwrap(),
            &keypair,
            TokenLifetimes::default(),
        )
        .unwrap();

        Self {
            signer: TokenSigner::new(&keypair).unwrap(),
            verifier: TokenVerifier::new(&keypair.public_key()).unwrap(),
            state: Arc::new(state),
            keypair,
        }
    }

    pub fn router(&self) -> axum::Router {
        create_router(self.state.clone())
    }

    pub fn app_token(&self, client: &str) -> String {
        self.signer
            .sign(&AppClaims::issue(client, Duration::days(365)).unwrap())
            .unwrap()
    }

    pub fn auth_token(&self, client: &str) -> String {
        self.signer
            .sign(&AuthClaims::issue(client, Duration::hours(1)).unwrap())
            .unwrap()
    }

    /// Serve the router on an ephemeral loopback port; returns its base URL.
    pub async fn spawn(&self) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = self.router();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }
}
