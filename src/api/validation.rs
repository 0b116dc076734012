use std::str::FromStr;

use super::ApiError;
use crate::models::UnknownVariant;

pub fn validate_id(resource: &str, id: i64) -> Result<i64, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid {resource} ID: {id}. ID must be a positive integer"
        )));
    }
    Ok(id)
}

pub fn validate_required<'a>(field: &str, value: &'a str) -> Result<&'a str, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation(format!("{field} is required")));
    }
    Ok(trimmed)
}

/// Strictly parses an optional query filter; an empty value means no filter.
pub fn parse_filter<T>(value: Option<&str>) -> Result<Option<T>, ApiError>
where
    T: FromStr<Err = UnknownVariant>,
{
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => Ok(Some(v.parse()?)),
    }
}

pub fn validate_size(size: Option<i64>) -> Result<Option<i64>, ApiError> {
    if let Some(size) = size
        && size < 0
    {
        return Err(ApiError::validation("Dataset size cannot be negative"));
    }
    Ok(size)
}

pub fn validate_min_size_mb(min_size_mb: Option<f64>) -> Result<Option<f64>, ApiError> {
    match min_size_mb {
        Some(mb) if !mb.is_finite() || mb < 0.0 => Err(ApiError::validation(
            "Minimum size must be a non-negative number of MB",
        )),
        other => Ok(other),
    }
}
