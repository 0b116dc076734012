use axum::{Json, extract::State};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState};
use crate::services::DashboardSummary;

/// GET /dashboard
/// Quick statistics and per-domain breakdowns
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<DashboardSummary>>, ApiError> {
    let summary = state.shared.dashboard.summary().await?;
    Ok(Json(ApiResponse::success(summary)))
}
