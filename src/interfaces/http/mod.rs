//! axum router exposing payments, chats and health probes.

mod chats;
mod payments;

use crate::application::payments::PaymentService;
use crate::domain::ports::ChatStoreBox;
use crate::error::PaymentError;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tracing::{error, warn};

/// Shared handles every request handler can reach.
pub struct AppState {
    pub payments: PaymentService,
    pub chats: ChatStoreBox,
}

/// Builds the application's routes over the shared `state`.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/payments/initiate", post(payments::initiate))
        .route(
            "/payments/confirm",
            post(payments::confirm).get(payments::confirm_callback),
        )
        .route("/jobs/:job_id/payments", get(payments::list_for_job))
        .route("/chats", post(chats::create_chat))
        .route("/chats/:chat_id", get(chats::get_chat))
        .route(
            "/chats/:chat_id/messages",
            post(chats::post_message).get(chats::list_messages),
        )
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn readyz(State(state): State<Arc<AppState>>) -> Response {
    let checks = tokio::try_join!(state.payments.ping(), state.chats.ping());
    match checks {
        Ok(_) => "ready".into_response(),
        Err(e) => {
            warn!(error = %e, "readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    }
}

impl PaymentError {
    /// HTTP status a failed request answers with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::NotFoundError(_) => StatusCode::NOT_FOUND,
            Self::GatewayError(_) => StatusCode::BAD_GATEWAY,
            Self::StoreError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for PaymentError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(%status, error = %self, "request failed");
        } else {
            warn!(%status, error = %self, "request rejected");
        }
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
