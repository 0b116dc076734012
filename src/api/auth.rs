use axum::{
    Json,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;
use uuid::Uuid;

use super::{ApiError, ApiResponse, AppState, MessageResponse};
use crate::models::Role;
use crate::services::UserInfo;

const SESSION_USER: &str = "user";
const SESSION_CHAT: &str = "chat_id";

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

// ============================================================================
// Middleware
// ============================================================================

/// Rejects requests without a logged-in session.
pub async fn auth_middleware(
    session: Session,
    request: Request,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    if let Ok(Some(user)) = session.get::<String>(SESSION_USER).await {
        tracing::Span::current().record("user_id", &user);
        return Ok(next.run(request).await);
    }

    Err(ApiError::Unauthorized("Not authenticated".to_string()))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/register
/// Create a regular user account
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<Json<ApiResponse<UserInfo>>, ApiError> {
    let info = state
        .auth()
        .register(payload.username.trim(), &payload.password, Role::User)
        .await?;

    Ok(Json(ApiResponse::success(info)))
}

/// POST /auth/login
/// Authenticate with username and password and start a session
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<CredentialsRequest>,
) -> Result<Json<ApiResponse<UserInfo>>, ApiError> {
    if payload.username.is_empty() {
        return Err(ApiError::validation("Username is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let info = state
        .auth()
        .login(payload.username.trim(), &payload.password)
        .await?;

    // A conversation belongs to whoever held the session when it started
    let previous_chat = session
        .remove::<String>(SESSION_CHAT)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?;
    if let Some(chat_id) = previous_chat {
        state.assistant().clear_history(&chat_id).await;
    }

    session
        .cycle_id()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;
    session
        .insert(SESSION_USER, &info.username)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;

    Ok(Json(ApiResponse::success(info)))
}

/// POST /auth/logout
/// Invalidate the current session and drop its chat history
pub async fn logout(State(state): State<Arc<AppState>>, session: Session) -> impl IntoResponse {
    if let Ok(Some(chat_id)) = session.get::<String>(SESSION_CHAT).await {
        state.assistant().clear_history(&chat_id).await;
    }
    if let Err(e) = session.flush().await {
        tracing::warn!("Failed to flush session on logout: {e}");
    }
    (
        StatusCode::OK,
        Json(ApiResponse::success(MessageResponse::new("Logged out"))),
    )
}

/// GET /auth/me
pub async fn get_current_user(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ApiResponse<UserInfo>>, ApiError> {
    let username = get_session_username(&session).await?;
    let info = state.auth().get_user_info(&username).await?;

    Ok(Json(ApiResponse::success(info)))
}

/// PUT /auth/password
/// Change password (requires current password verification)
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let username = get_session_username(&session).await?;

    state
        .auth()
        .change_password(&username, &payload.current_password, &payload.new_password)
        .await
        .map_err(|e| match e {
            crate::services::AuthError::InvalidCredentials => {
                ApiError::validation("Current password is incorrect")
            }
            other => other.into(),
        })?;

    tracing::info!("Password changed for user: {username}");

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Password updated successfully",
    ))))
}

// ============================================================================
// Helpers
// ============================================================================

/// Get username from session, returns error if not authenticated
pub(crate) async fn get_session_username(session: &Session) -> Result<String, ApiError> {
    session
        .get::<String>(SESSION_USER)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?
        .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))
}

/// Identifier for this session's assistant conversation, created on first use.
pub(crate) async fn chat_session_id(session: &Session) -> Result<String, ApiError> {
    let existing = session
        .get::<String>(SESSION_CHAT)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?;

    if let Some(id) = existing {
        return Ok(id);
    }

    let id = Uuid::new_v4().to_string();
    session
        .insert(SESSION_CHAT, &id)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?;
    Ok(id)
}
