use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::validation::{parse_filter, validate_id, validate_required};
use super::{ApiError, ApiResponse, AppState, StatusUpdateRequest};
use crate::db::{IncidentFilter, Record};
use crate::models::{DomainRecord, NewIncident, SecurityIncident, Status};

#[derive(Debug, Deserialize)]
pub struct IncidentQuery {
    pub status: Option<String>,
    pub severity: Option<String>,
}

/// GET /incidents
pub async fn list_incidents(
    State(state): State<Arc<AppState>>,
    Query(query): Query<IncidentQuery>,
) -> Result<Json<ApiResponse<Vec<Record>>>, ApiError> {
    let filter = IncidentFilter {
        status: parse_filter(query.status.as_deref())?,
        severity: parse_filter(query.severity.as_deref())?,
    };

    let incidents = state.store().incidents().list(filter).await?;
    Ok(Json(ApiResponse::success(
        incidents.iter().map(DomainRecord::to_dict).collect(),
    )))
}

/// POST /incidents
pub async fn create_incident(
    State(state): State<Arc<AppState>>,
    Json(mut payload): Json<NewIncident>,
) -> Result<Json<ApiResponse<Record>>, ApiError> {
    payload.title = validate_required("Title", &payload.title)?.to_string();

    let incident = state
        .store()
        .incidents()
        .create(SecurityIncident::from(payload))
        .await?;

    tracing::info!(id = ?incident.id(), severity = %incident.severity(), "Incident reported");
    Ok(Json(ApiResponse::success(incident.to_dict())))
}

/// GET /incidents/{id}
pub async fn get_incident(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Record>>, ApiError> {
    validate_id("incident", id)?;

    let incident = state
        .store()
        .incidents()
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Incident", id))?;

    Ok(Json(ApiResponse::success(incident.to_dict())))
}

/// PUT /incidents/{id}/status
pub async fn update_incident_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<StatusUpdateRequest>,
) -> Result<Json<ApiResponse<Record>>, ApiError> {
    validate_id("incident", id)?;
    let status: Status = payload.status.trim().parse()?;

    let incident = state
        .store()
        .incidents()
        .update_status(id, status)
        .await?
        .ok_or_else(|| ApiError::not_found("Incident", id))?;

    Ok(Json(ApiResponse::success(incident.to_dict())))
}

/// DELETE /incidents/{id}
pub async fn delete_incident(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    validate_id("incident", id)?;

    if !state.store().incidents().delete(id).await? {
        return Err(ApiError::not_found("Incident", id));
    }

    Ok(Json(ApiResponse::success(())))
}
