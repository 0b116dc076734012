//! AI assistant endpoints.
//!
//! Assistant failures are not HTTP errors: the explanation comes back as the
//! reply text so the client can show it directly.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_sessions::Session;

use super::auth::chat_session_id;
use super::validation::{validate_id, validate_required};
use super::{ApiError, ApiResponse, AppState, MessageResponse};
use crate::clients::openai::ChatMessage;
use crate::services::AssistantDomain;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub domain: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
    pub domain: AssistantDomain,
    pub configured: bool,
}

/// POST /assistant/chat
pub async fn chat(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ApiResponse<ChatResponse>>, ApiError> {
    let message = validate_required("Message", &payload.message)?;
    let domain = payload
        .domain
        .as_deref()
        .map(AssistantDomain::from_tag)
        .unwrap_or_default();
    let chat_id = chat_session_id(&session).await?;

    let assistant = state.assistant();
    let reply = assistant.send_message(&chat_id, message, domain).await;

    Ok(Json(ApiResponse::success(ChatResponse {
        reply,
        domain,
        configured: assistant.is_configured(),
    })))
}

/// GET /assistant/history
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ApiResponse<Vec<ChatMessage>>>, ApiError> {
    let chat_id = chat_session_id(&session).await?;
    Ok(Json(ApiResponse::success(
        state.assistant().history(&chat_id).await,
    )))
}

/// DELETE /assistant/history
pub async fn clear_history(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let chat_id = chat_session_id(&session).await?;
    state.assistant().clear_history(&chat_id).await;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Chat history cleared",
    ))))
}

/// POST /assistant/incidents/{id}/analyze
pub async fn analyze_incident(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ChatResponse>>, ApiError> {
    validate_id("incident", id)?;
    let incident = state
        .store()
        .incidents()
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Incident", id))?;
    let chat_id = chat_session_id(&session).await?;

    let assistant = state.assistant();
    let reply = assistant.analyze_incident(&chat_id, &incident).await;

    Ok(Json(ApiResponse::success(ChatResponse {
        reply,
        domain: AssistantDomain::Cybersecurity,
        configured: assistant.is_configured(),
    })))
}

/// POST /assistant/datasets/{id}/analyze
pub async fn analyze_dataset(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ChatResponse>>, ApiError> {
    validate_id("dataset", id)?;
    let dataset = state
        .store()
        .datasets()
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Dataset", id))?;
    let chat_id = chat_session_id(&session).await?;

    let assistant = state.assistant();
    let reply = assistant.analyze_dataset(&chat_id, &dataset).await;

    Ok(Json(ApiResponse::success(ChatResponse {
        reply,
        domain: AssistantDomain::DataScience,
        configured: assistant.is_configured(),
    })))
}
