use super::AppState;
use crate::application::payments::{ConfirmedPayment, InitiatePayment, InitiatedPayment};
use crate::domain::payment::Payment;
use crate::error::Result;
use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Default, Deserialize)]
pub struct ConfirmPayment {
    /// Chapa's callback names the reference `trx_ref`.
    #[serde(default, alias = "trx_ref")]
    pub tx_ref: String,
}

pub async fn initiate(
    State(state): State<Arc<AppState>>,
    Json(request): Json<InitiatePayment>,
) -> Result<Json<InitiatedPayment>> {
    state.payments.initiate(request).await.map(Json)
}

/// A missing or unreadable body is treated as an empty reference.
pub async fn confirm(
    State(state): State<Arc<AppState>>,
    request: Option<Json<ConfirmPayment>>,
) -> Result<Json<ConfirmedPayment>> {
    let Json(request) = request.unwrap_or_default();
    state.payments.confirm(&request.tx_ref).await.map(Json)
}

pub async fn confirm_callback(
    State(state): State<Arc<AppState>>,
    Query(request): Query<ConfirmPayment>,
) -> Result<Json<ConfirmedPayment>> {
    state.payments.confirm(&request.tx_ref).await.map(Json)
}

pub async fn list_for_job(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> Result<Json<Vec<Payment>>> {
    state.payments.payments_for_job(&job_id).await.map(Json)
}
