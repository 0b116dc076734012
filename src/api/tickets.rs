use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::validation::{parse_filter, validate_id, validate_required};
use super::{ApiError, ApiResponse, AppState, AssigneeUpdateRequest, StatusUpdateRequest};
use crate::db::{Record, TicketFilter};
use crate::models::{DomainRecord, ItTicket, NewTicket, Status};

#[derive(Debug, Deserialize)]
pub struct TicketQuery {
    pub status: Option<String>,
    pub priority: Option<String>,
}

fn ticket_not_found(id: i64) -> ApiError {
    ApiError::not_found("Ticket", id)
}

/// GET /tickets
pub async fn list_tickets(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TicketQuery>,
) -> Result<Json<ApiResponse<Vec<Record>>>, ApiError> {
    let filter = TicketFilter {
        status: parse_filter(query.status.as_deref())?,
        priority: parse_filter(query.priority.as_deref())?,
    };

    let tickets = state.store().tickets().list(filter).await?;
    Ok(Json(ApiResponse::success(
        tickets.iter().map(DomainRecord::to_dict).collect(),
    )))
}

/// POST /tickets
pub async fn create_ticket(
    State(state): State<Arc<AppState>>,
    Json(mut payload): Json<NewTicket>,
) -> Result<Json<ApiResponse<Record>>, ApiError> {
    payload.title = validate_required("Title", &payload.title)?.to_string();

    let ticket = state
        .store()
        .tickets()
        .create(ItTicket::from(payload))
        .await?;

    tracing::info!(id = ?ticket.id(), priority = %ticket.priority(), "Ticket opened");
    Ok(Json(ApiResponse::success(ticket.to_dict())))
}

/// GET /tickets/{id}
pub async fn get_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Record>>, ApiError> {
    validate_id("ticket", id)?;

    let ticket = state
        .store()
        .tickets()
        .get(id)
        .await?
        .ok_or_else(|| ticket_not_found(id))?;

    Ok(Json(ApiResponse::success(ticket.to_dict())))
}

/// PUT /tickets/{id}/status
pub async fn update_ticket_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<StatusUpdateRequest>,
) -> Result<Json<ApiResponse<Record>>, ApiError> {
    validate_id("ticket", id)?;
    let status: Status = payload.status.trim().parse()?;

    let ticket = state
        .store()
        .tickets()
        .update_status(id, status)
        .await?
        .ok_or_else(|| ticket_not_found(id))?;

    Ok(Json(ApiResponse::success(ticket.to_dict())))
}

/// PUT /tickets/{id}/assignee
pub async fn assign_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<AssigneeUpdateRequest>,
) -> Result<Json<ApiResponse<Record>>, ApiError> {
    validate_id("ticket", id)?;
    let assignee = validate_required("Assignee", &payload.assigned_to)?;

    let ticket = state
        .store()
        .tickets()
        .assign(id, assignee)
        .await?
        .ok_or_else(|| ticket_not_found(id))?;

    Ok(Json(ApiResponse::success(ticket.to_dict())))
}

/// POST /tickets/{id}/close
pub async fn close_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Record>>, ApiError> {
    validate_id("ticket", id)?;

    let ticket = state
        .store()
        .tickets()
        .close(id)
        .await?
        .ok_or_else(|| ticket_not_found(id))?;

    Ok(Json(ApiResponse::success(ticket.to_dict())))
}

/// DELETE /tickets/{id}
pub async fn delete_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    validate_id("ticket", id)?;

    if !state.store().tickets().delete(id).await? {
        return Err(ticket_not_found(id));
    }

    Ok(Json(ApiResponse::success(())))
}
