use axum::{
    Json,
    extract::{Path, Query, State},
};
use std::sync::Arc;

use super::validation::{validate_id, validate_min_size_mb, validate_required, validate_size};
use super::{ApiError, ApiResponse, AppState};
use crate::db::{DatasetFilter, Record};
use crate::models::{Dataset, DomainRecord, NewDataset};

/// GET /datasets
pub async fn list_datasets(
    State(state): State<Arc<AppState>>,
    Query(mut filter): Query<DatasetFilter>,
) -> Result<Json<ApiResponse<Vec<Record>>>, ApiError> {
    filter.min_size_mb = validate_min_size_mb(filter.min_size_mb)?;
    let datasets = state.store().datasets().list(filter).await?;
    Ok(Json(ApiResponse::success(
        datasets.iter().map(DomainRecord::to_dict).collect(),
    )))
}

/// POST /datasets
pub async fn create_dataset(
    State(state): State<Arc<AppState>>,
    Json(mut payload): Json<NewDataset>,
) -> Result<Json<ApiResponse<Record>>, ApiError> {
    payload.name = validate_required("Name", &payload.name)?.to_string();
    payload.size = validate_size(payload.size)?;

    let dataset = state
        .store()
        .datasets()
        .create(Dataset::from(payload))
        .await?;

    tracing::info!(id = ?dataset.id(), name = %dataset.name(), "Dataset registered");
    Ok(Json(ApiResponse::success(dataset.to_dict())))
}

/// GET /datasets/{id}
pub async fn get_dataset(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Record>>, ApiError> {
    validate_id("dataset", id)?;

    let dataset = state
        .store()
        .datasets()
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Dataset", id))?;

    Ok(Json(ApiResponse::success(dataset.to_dict())))
}

/// DELETE /datasets/{id}
pub async fn delete_dataset(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    validate_id("dataset", id)?;

    if !state.store().datasets().delete(id).await? {
        return Err(ApiError::not_found("Dataset", id));
    }

    Ok(Json(ApiResponse::success(())))
}
