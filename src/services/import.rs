//! Bulk loading of incidents, datasets and tickets from CSV exports.
//!
//! Rows go through the same lenient constructors as the API, so unknown
//! severities or statuses become their defaults. Rows that cannot be parsed,
//! or that have no title or name, are skipped and counted.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::{info, warn};

use crate::db::Store;
use crate::models::{Dataset, ItTicket, NewDataset, NewIncident, NewTicket, SecurityIncident};

pub const INCIDENTS_FILE: &str = "cyber_incidents.csv";
pub const DATASETS_FILE: &str = "datasets_metadata.csv";
pub const TICKETS_FILE: &str = "it_tickets.csv";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
}

/// Per-file outcome of [`CsvImporter::import_dir`]; `None` when the file was absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub incidents: Option<ImportReport>,
    pub datasets: Option<ImportReport>,
    pub tickets: Option<ImportReport>,
}

#[derive(Debug, Deserialize)]
struct IncidentRow {
    #[serde(default)]
    title: String,
    #[serde(default)]
    severity: Option<String>,
    /// Older exports carry the severity under this name.
    #[serde(default)]
    priority: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    reported_by: Option<String>,
    #[serde(default)]
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DatasetRow {
    #[serde(default)]
    name: String,
    #[serde(default)]
    source: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    size: Option<i64>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TicketRow {
    #[serde(default)]
    subject: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    priority: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    assigned_to: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    created_date: Option<String>,
}

/// Exports identify people by numeric user id; those become `User_<id>`.
fn person_label(value: Option<String>) -> String {
    match value.as_deref().map(str::trim) {
        None | Some("") => "User_1".to_string(),
        Some(v) if v.chars().all(|c| c.is_ascii_digit()) => format!("User_{v}"),
        Some(v) => v.to_string(),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Parses every row, returning the good ones and the number of bad ones.
fn parse_rows<T: DeserializeOwned>(data: &[u8], source: &str) -> (Vec<T>, usize) {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(data);

    let mut rows = Vec::new();
    let mut skipped = 0;
    for (line, result) in reader.deserialize::<T>().enumerate() {
        match result {
            Ok(row) => rows.push(row),
            Err(e) => {
                warn!(source, row = line + 1, "Skipping unreadable CSV row: {e}");
                skipped += 1;
            }
        }
    }
    (rows, skipped)
}

pub struct CsvImporter {
    store: Store,
}

impl CsvImporter {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn import_incidents(&self, data: &[u8]) -> Result<ImportReport> {
        let (rows, mut skipped) = parse_rows::<IncidentRow>(data, INCIDENTS_FILE);
        let repo = self.store.incidents();
        let mut imported = 0;

        for row in rows {
            if row.title.is_empty() {
                skipped += 1;
                continue;
            }
            let incident = SecurityIncident::from(NewIncident {
                title: row.title,
                severity: non_blank(row.severity).or_else(|| non_blank(row.priority)),
                status: non_blank(row.status),
                description: row.description,
                reported_by: person_label(row.reported_by),
                date: non_blank(row.date),
            });
            repo.create(incident).await?;
            imported += 1;
        }

        Ok(ImportReport { imported, skipped })
    }

    pub async fn import_datasets(&self, data: &[u8]) -> Result<ImportReport> {
        let (rows, mut skipped) = parse_rows::<DatasetRow>(data, DATASETS_FILE);
        let repo = self.store.datasets();
        let mut imported = 0;

        for row in rows {
            if row.name.is_empty() {
                skipped += 1;
                continue;
            }
            let size = match row.size {
                Some(size) if size < 0 => {
                    warn!(name = %row.name, size, "Negative dataset size, storing 0");
                    None
                }
                other => other,
            };
            let mut dataset = Dataset::from(NewDataset {
                name: row.name,
                source: row.source,
                category: row.category,
                size,
                description: row.description,
            });
            if let Some(created_at) = row.created_at {
                dataset = dataset.with_created_at(created_at);
            }
            repo.create(dataset).await?;
            imported += 1;
        }

        Ok(ImportReport { imported, skipped })
    }

    pub async fn import_tickets(&self, data: &[u8]) -> Result<ImportReport> {
        let (rows, mut skipped) = parse_rows::<TicketRow>(data, TICKETS_FILE);
        let repo = self.store.tickets();
        let mut imported = 0;

        for row in rows {
            let Some(title) = non_blank(row.subject).or_else(|| non_blank(row.title)) else {
                skipped += 1;
                continue;
            };
            let ticket = ItTicket::from(NewTicket {
                title,
                priority: non_blank(row.priority),
                status: non_blank(row.status),
                assigned_to: person_label(row.assigned_to),
                description: row.description,
                created_date: non_blank(row.created_date),
            });
            repo.create(ticket).await?;
            imported += 1;
        }

        Ok(ImportReport { imported, skipped })
    }

    /// Imports whichever of the three standard export files exist in `dir`.
    pub async fn import_dir(&self, dir: &Path) -> Result<ImportSummary> {
        let mut summary = ImportSummary::default();

        if let Some(data) = read_optional(&dir.join(INCIDENTS_FILE)).await? {
            summary.incidents = Some(self.import_incidents(&data).await?);
        }
        if let Some(data) = read_optional(&dir.join(DATASETS_FILE)).await? {
            summary.datasets = Some(self.import_datasets(&data).await?);
        }
        if let Some(data) = read_optional(&dir.join(TICKETS_FILE)).await? {
            summary.tickets = Some(self.import_tickets(&data).await?);
        }

        info!(?summary, "CSV import finished");
        Ok(summary)
    }
}

async fn read_optional(path: &Path) -> Result<Option<Vec<u8>>> {
    match tokio::fs::read(path).await {
        Ok(data) => Ok(Some(data)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("{} not found, skipping", path.display());
            Ok(None)
        }
        Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
    }
}
