// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared fixtures for unit tests: RSA test keys, token minting and a
//! throwaway JWKS endpoint on localhost.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use axum::{extract::State, routing::get, Json, Router};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};

use crate::auth::{AuthGate, KeySet, KeySetFetcher, TokenVerifier};
use crate::state::AppState;
use crate::store::InMemoryStore;

pub const KEY_ID: &str = "drinks-test-key";
pub const ISSUER: &str = "https://drinks-test.auth0.com/";
pub const AUDIENCE: &str = "drinks";

/// How long the stalled JWKS endpoint waits before responding.
pub const STALL: Duration = Duration::from_secs(5);

const KEY_PEM: &[u8] = include_bytes!("../testdata/key_a.pem");
const FOREIGN_KEY_PEM: &[u8] = include_bytes!("../testdata/key_b.pem");

/// Modulus of `testdata/key_a.pem`.
const KEY_MODULUS: &str = "w1oCISWYY_UN5DYduwna9SOpvkhb9cMZLE9PZTrhtBeWqRWrz-9VAvPBCGir1-fxq5dsoieUm2YYKjBlsW90iAKyJQ6YdHYiCvZG9NgWGZETDlGDtoONEaBEb2XWq3VJJCm5ne9kVN2dVl9UXWxI0JSNllD8kx9_Z-k1XUVHsXHI05koiJx0B6xpi0XzI2AZ8OFcupnyf3If3Dn2ab6-57mlgCVwhkjS3-LEGLRdq2R6JDCQaOGIRW6n9x1SU5AaJjzj31sP7yNzDjD_QsNlOJ9-BcA1g1gC7as1nhdFbdkB3wdvO-V_EsGNC3huSAINo2-D-aV_o0lq7LvfFY-QBw";
const KEY_EXPONENT: &str = "AQAB";

pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// The JWKS document publishing the test key.
pub fn jwks_document() -> Value {
    json!({
        "keys": [{
            "kty": "RSA",
            "kid": KEY_ID,
            "use": "sig",
            "alg": "RS256",
            "n": KEY_MODULUS,
            "e": KEY_EXPONENT
        }]
    })
}

pub fn key_set() -> KeySet {
    serde_json::from_value(jwks_document()).expect("valid JWKS fixture")
}

/// Claims accepted by [`verifier`], valid for an hour.
pub fn valid_claims(permissions: &[&str]) -> Value {
    json!({
        "iss": ISSUER,
        "sub": "auth0|barista",
        "aud": AUDIENCE,
        "iat": now(),
        "exp": now() + 3600,
        "permissions": permissions
    })
}

/// Sign `claims` with the published test key.
pub fn mint(claims: &Value, kid: Option<&str>) -> String {
    sign(claims, kid, KEY_PEM)
}

/// Sign `claims` with a key that is not in the JWKS, under a published `kid`.
pub fn mint_with_foreign_key(claims: &Value, kid: &str) -> String {
    sign(claims, Some(kid), FOREIGN_KEY_PEM)
}

fn sign(claims: &Value, kid: Option<&str>, pem: &[u8]) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = kid.map(str::to_string);
    let key = EncodingKey::from_rsa_pem(pem).expect("valid RSA test key");
    encode(&header, claims, &key).expect("token signing succeeds")
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

/// Verifier that fetches keys from `server` on every request.
pub fn verifier(server: &JwksServer) -> TokenVerifier {
    let fetcher =
        KeySetFetcher::new(server.url(), Duration::from_secs(5)).expect("HTTP client builds");
    TokenVerifier::new(fetcher, ISSUER, AUDIENCE, vec![Algorithm::RS256])
}

pub fn gate(server: &JwksServer) -> AuthGate {
    AuthGate::new(verifier(server))
}

pub fn app_state(server: &JwksServer) -> AppState {
    AppState::new(InMemoryStore::new(), gate(server))
}

#[derive(Clone)]
struct JwksState {
    hits: Arc<AtomicUsize>,
    document: Arc<RwLock<Value>>,
}

/// JWKS endpoint served from a local port for the lifetime of the test runtime.
pub struct JwksServer {
    addr: SocketAddr,
    state: JwksState,
}

impl JwksServer {
    pub async fn start(document: Value) -> Self {
        let state = JwksState {
            hits: Arc::new(AtomicUsize::new(0)),
            document: Arc::new(RwLock::new(document)),
        };
        let app = Router::new()
            .route("/.well-known/jwks.json", get(serve_jwks))
            .route("/stalled/jwks.json", get(serve_jwks_stalled))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind local JWKS server");
        let addr = listener.local_addr().expect("local address");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, state }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn url(&self) -> String {
        format!("{}/.well-known/jwks.json", self.base_url())
    }

    /// Endpoint that holds the response for [`STALL`] before answering.
    pub fn stalled_url(&self) -> String {
        format!("{}/stalled/jwks.json", self.base_url())
    }

    /// Number of JWKS requests served so far.
    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }

    /// Replace the published document, e.g. to simulate key rotation.
    pub fn set_document(&self, document: Value) {
        *self.state.document.write().expect("document lock") = document;
    }
}

async fn serve_jwks(State(state): State<JwksState>) -> Json<Value> {
    state.hits.fetch_add(1, Ordering::SeqCst);
    let document = state.document.read().expect("document lock").clone();
    Json(document)
}

async fn serve_jwks_stalled(state: State<JwksState>) -> Json<Value> {
    tokio::time::sleep(STALL).await;
    serve_jwks(state).await
}
