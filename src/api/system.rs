//! System API endpoints.

use axum::{Json, extract::State};
use serde::Serialize;
use std::sync::Arc;

use super::{ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: bool,
    pub assistant: bool,
    pub version: &'static str,
    pub uptime: u64,
}

/// Liveness and database reachability.
///
/// # Endpoint
/// `GET /api/system/health`
pub async fn get_health(State(state): State<Arc<AppState>>) -> Json<ApiResponse<HealthResponse>> {
    let database = match state.store().ping().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("Health check: database unreachable: {e}");
            false
        }
    };

    Json(ApiResponse::success(HealthResponse {
        status: "ok",
        database,
        assistant: state.assistant().is_configured(),
        version: env!("CARGO_PKG_VERSION"),
        uptime: state.start_time.elapsed().as_secs(),
    }))
}
