#![allow(dead_code)]

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use hirehub::config::{ChapaConfig, GATEWAY_TIMEOUT};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

pub const SECRET: &str = "CHASECK_TEST-secret";
pub const CHECKOUT_URL: &str = "https://pay.example/abc";

/// Canned answer served by the stub gateway.
#[derive(Clone)]
pub struct StubResponse {
    pub status: StatusCode,
    pub body: String,
    pub delay: Duration,
}

impl StubResponse {
    pub fn json(value: serde_json::Value) -> Self {
        Self {
            status: StatusCode::OK,
            body: value.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn raw(status: StatusCode, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn checkout(url: &str) -> Self {
        Self::json(serde_json::json!({
            "status": "success",
            "message": "Hosted Link",
            "data": { "checkout_url": url }
        }))
    }

    /// A successful envelope whose inner verdict is `verdict`.
    pub fn verified(verdict: &str) -> Self {
        Self::json(serde_json::json!({
            "status": "success",
            "message": "Payment details",
            "data": { "tx_ref": "echo", "status": verdict }
        }))
    }
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub authorization: Option<String>,
    pub body: String,
    pub tx_ref: Option<String>,
}

#[derive(Clone)]
struct StubState {
    initialize: Arc<Mutex<StubResponse>>,
    verify: Arc<Mutex<StubResponse>>,
    initialize_calls: Arc<Mutex<Vec<RecordedCall>>>,
    verify_calls: Arc<Mutex<Vec<RecordedCall>>>,
}

/// An HTTP stand-in for the Chapa API bound to a random local port.
pub struct StubChapa {
    pub base_url: String,
    state: StubState,
}

fn authorization(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn reply(canned: StubResponse) -> Response {
    tokio::time::sleep(canned.delay).await;
    (canned.status, canned.body).into_response()
}

async fn initialize(State(state): State<StubState>, headers: HeaderMap, body: String) -> Response {
    state.initialize_calls.lock().unwrap().push(RecordedCall {
        authorization: authorization(&headers),
        body,
        tx_ref: None,
    });
    let canned = state.initialize.lock().unwrap().clone();
    reply(canned).await
}

async fn verify(
    State(state): State<StubState>,
    Path(tx_ref): Path<String>,
    headers: HeaderMap,
) -> Response {
    state.verify_calls.lock().unwrap().push(RecordedCall {
        authorization: authorization(&headers),
        body: String::new(),
        tx_ref: Some(tx_ref),
    });
    let canned = state.verify.lock().unwrap().clone();
    reply(canned).await
}

impl StubChapa {
    pub async fn start() -> Self {
        let state = StubState {
            initialize: Arc::new(Mutex::new(StubResponse::checkout(CHECKOUT_URL))),
            verify: Arc::new(Mutex::new(StubResponse::verified("success"))),
            initialize_calls: Arc::default(),
            verify_calls: Arc::default(),
        };

        let app = Router::new()
            .route("/v1/transaction/initialize", post(initialize))
            .route("/v1/transaction/verify/:tx_ref", get(verify))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    pub fn set_initialize(&self, response: StubResponse) {
        *self.state.initialize.lock().unwrap() = response;
    }

    pub fn set_verify(&self, response: StubResponse) {
        *self.state.verify.lock().unwrap() = response;
    }

    pub fn initialize_calls(&self) -> Vec<RecordedCall> {
        self.state.initialize_calls.lock().unwrap().clone()
    }

    pub fn verify_calls(&self) -> Vec<RecordedCall> {
        self.state.verify_calls.lock().unwrap().clone()
    }

    pub fn config(&self) -> ChapaConfig {
        ChapaConfig {
            public_key: "CHAPUBK_TEST".to_string(),
            secret_key: SECRET.to_string(),
            base_url: self.base_url.clone(),
            return_url: "http://localhost:3000/payments/return".to_string(),
            callback_url: "http://localhost:8080/payments/confirm".to_string(),
            timeout: GATEWAY_TIMEOUT,
        }
    }

    pub fn config_with_timeout(&self, timeout: Duration) -> ChapaConfig {
        ChapaConfig {
            timeout,
            ..self.config()
        }
    }
}
