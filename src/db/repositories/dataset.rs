use sea_orm::Value;
use serde::Deserialize;

use super::{Cmp, Repository};
use crate::db::StoreError;
use crate::models::Dataset;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatasetFilter {
    pub category: Option<String>,
    /// Only datasets of at least this many megabytes.
    pub min_size_mb: Option<f64>,
}

impl Repository<Dataset> {
    pub async fn list(&self, filter: DatasetFilter) -> Result<Vec<Dataset>, StoreError> {
        let mut conditions: Vec<(&str, Cmp, Value)> = Vec::new();
        if let Some(category) = filter.category.filter(|c| !c.is_empty()) {
            conditions.push(("category", Cmp::Eq, category.into()));
        }
        if let Some(min_mb) = filter.min_size_mb.filter(|mb| *mb > 0.0) {
            // Whole bytes: size_mb >= min_mb holds exactly when size >= ceil(min_mb * 2^20)
            let min_bytes = (min_mb * BYTES_PER_MB).ceil() as i64;
            conditions.push(("size", Cmp::AtLeast, min_bytes.into()));
        }

        self.list_where(&conditions, "created_at DESC, id DESC").await
    }
}
