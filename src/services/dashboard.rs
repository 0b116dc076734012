//! Quick statistics across all three domains.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::db::{Store, StoreError};
use crate::models::Status;

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

#[derive(Debug, Clone, Serialize)]
pub struct IncidentStats {
    pub total: i64,
    /// Open or In Progress.
    pub active: i64,
    pub by_severity: BTreeMap<String, i64>,
    pub by_status: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatasetStats {
    pub total: i64,
    pub total_size_gb: f64,
    pub categories: i64,
    pub by_category: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TicketStats {
    pub total: i64,
    /// Open or In Progress.
    pub open: i64,
    pub by_priority: BTreeMap<String, i64>,
    pub by_status: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub users: i64,
    pub incidents: IncidentStats,
    pub datasets: DatasetStats,
    pub tickets: TicketStats,
}

fn active_count(by_status: &BTreeMap<String, i64>) -> i64 {
    by_status
        .iter()
        .filter(|(label, _)| label.parse::<Status>().is_ok_and(|s| s.is_active()))
        .map(|(_, count)| count)
        .sum()
}

pub struct DashboardService {
    store: Store,
}

impl DashboardService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn summary(&self) -> Result<DashboardSummary, StoreError> {
        let incidents = self.store.incidents();
        let incidents_by_status: BTreeMap<_, _> =
            incidents.count_by("status").await?.into_iter().collect();
        let incident_stats = IncidentStats {
            total: incidents.count().await?,
            active: active_count(&incidents_by_status),
            by_severity: incidents.count_by("severity").await?.into_iter().collect(),
            by_status: incidents_by_status,
        };

        let datasets = self.store.datasets();
        let by_category: BTreeMap<_, _> = datasets
            .count_by("category")
            .await?
            .into_iter()
            .filter(|(category, _)| !category.is_empty())
            .collect();
        let dataset_stats = DatasetStats {
            total: datasets.count().await?,
            total_size_gb: self.total_dataset_bytes().await? as f64 / BYTES_PER_GB,
            categories: by_category.len() as i64,
            by_category,
        };

        let tickets = self.store.tickets();
        let tickets_by_status: BTreeMap<_, _> =
            tickets.count_by("status").await?.into_iter().collect();
        let ticket_stats = TicketStats {
            total: tickets.count().await?,
            open: active_count(&tickets_by_status),
            by_priority: tickets.count_by("priority").await?.into_iter().collect(),
            by_status: tickets_by_status,
        };

        Ok(DashboardSummary {
            users: self.store.users().count().await?,
            incidents: incident_stats,
            datasets: dataset_stats,
            tickets: ticket_stats,
        })
    }

    async fn total_dataset_bytes(&self) -> Result<i64, StoreError> {
        self.store
            .fetch_scalar(
                "SELECT COALESCE(SUM(size), 0) AS value FROM datasets_metadata",
                vec![],
            )
            .await
    }
}
