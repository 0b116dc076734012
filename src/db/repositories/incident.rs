use sea_orm::Value;

use super::{Cmp, Repository};
use crate::db::StoreError;
use crate::models::{SecurityIncident, Severity, Status};

#[derive(Debug, Clone, Copy, Default)]
pub struct IncidentFilter {
    pub status: Option<Status>,
    pub severity: Option<Severity>,
}

impl Repository<SecurityIncident> {
    /// Most recent first.
    pub async fn list(&self, filter: IncidentFilter) -> Result<Vec<SecurityIncident>, StoreError> {
        let mut conditions: Vec<(&str, Cmp, Value)> = Vec::new();
        if let Some(status) = filter.status {
            conditions.push(("status", Cmp::Eq, status.as_str().into()));
        }
        if let Some(severity) = filter.severity {
            conditions.push(("severity", Cmp::Eq, severity.as_str().into()));
        }

        self.list_where(&conditions, "date DESC, id DESC").await
    }

    pub async fn update_status(
        &self,
        id: i64,
        status: Status,
    ) -> Result<Option<SecurityIncident>, StoreError> {
        self.modify(id, "status", |incident| {
            incident.update_status(status.as_str());
        })
        .await
    }
}
