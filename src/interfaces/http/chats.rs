use super::AppState;
use crate::domain::chat::{Chat, Message};
use crate::error::{PaymentError, Result};
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CreateChat {
    pub job_id: Uuid,
    pub employer_id: Uuid,
    pub candidate_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct PostMessage {
    pub sender_id: Uuid,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub attachment: Option<String>,
}

pub async fn create_chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateChat>,
) -> Result<(StatusCode, Json<Chat>)> {
    let chat = Chat::new(request.job_id, request.employer_id, request.candidate_id);
    state.chats.create_chat(chat.clone()).await?;
    Ok((StatusCode::CREATED, Json(chat)))
}

pub async fn get_chat(
    State(state): State<Arc<AppState>>,
    Path(chat_id): Path<Uuid>,
) -> Result<Json<Chat>> {
    state
        .chats
        .get_chat(chat_id)
        .await?
        .map(Json)
        .ok_or_else(|| PaymentError::NotFoundError(format!("chat {}", chat_id)))
}

pub async fn post_message(
    State(state): State<Arc<AppState>>,
    Path(chat_id): Path<Uuid>,
    Json(request): Json<PostMessage>,
) -> Result<(StatusCode, Json<Message>)> {
    let message = Message::new(chat_id, request.sender_id, request.content, request.attachment)?;
    state.chats.create_message(message.clone()).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    Path(chat_id): Path<Uuid>,
) -> Result<Json<Vec<Message>>> {
    if state.chats.get_chat(chat_id).await?.is_none() {
        return Err(PaymentError::NotFoundError(format!("chat {}", chat_id)));
    }
    state.chats.messages(chat_id).await.map(Json)
}
