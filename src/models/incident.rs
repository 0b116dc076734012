use serde::{Deserialize, Serialize};
use std::fmt;

use super::{DomainRecord, Severity, Status, null_as_default, null_as_now, null_as_today};

/// A reported cybersecurity incident.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityIncident {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    title: String,
    #[serde(default)]
    severity: Severity,
    #[serde(default)]
    status: Status,
    #[serde(default, deserialize_with = "null_as_default")]
    description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    reported_by: String,
    #[serde(default = "super::today", deserialize_with = "null_as_today")]
    date: String,
    #[serde(default = "super::now_timestamp", deserialize_with = "null_as_now")]
    created_at: String,
}

/// Fields accepted when reporting an incident.
///
/// Severity and status are free text; unrecognised values fall back to
/// Medium and Open.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewIncident {
    pub title: String,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub reported_by: String,
    #[serde(default)]
    pub date: Option<String>,
}

impl From<NewIncident> for SecurityIncident {
    fn from(input: NewIncident) -> Self {
        Self {
            id: None,
            title: input.title,
            severity: input
                .severity
                .as_deref()
                .map(Severity::parse_lenient)
                .unwrap_or_default(),
            status: input
                .status
                .as_deref()
                .map(Status::parse_lenient)
                .unwrap_or_default(),
            description: input.description,
            reported_by: input.reported_by,
            date: input
                .date
                .filter(|d| !d.is_empty())
                .unwrap_or_else(super::today),
            created_at: super::now_timestamp(),
        }
    }
}

impl SecurityIncident {
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub const fn severity(&self) -> Severity {
        self.severity
    }

    #[must_use]
    pub const fn status(&self) -> Status {
        self.status
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn reported_by(&self) -> &str {
        &self.reported_by
    }

    #[must_use]
    pub fn date(&self) -> &str {
        &self.date
    }

    #[must_use]
    pub fn created_at(&self) -> &str {
        &self.created_at
    }

    /// Numeric severity, 1 (Low) through 4 (Critical).
    #[must_use]
    pub const fn severity_level(&self) -> u8 {
        self.severity.rank()
    }

    /// Moves the incident to `new_status`. Unrecognised labels are ignored.
    pub fn update_status(&mut self, new_status: &str) {
        if let Ok(status) = new_status.parse() {
            self.status = status;
        }
    }
}

impl DomainRecord for SecurityIncident {
    const TABLE: &'static str = "cyber_incidents";

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }
}

impl fmt::Display for SecurityIncident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SecurityIncident(id={}, title='{}', severity='{}', status='{}')",
            self.id.map_or_else(|| "-".to_string(), |id| id.to_string()),
            self.title,
            self.severity,
            self.status
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phishing() -> SecurityIncident {
        SecurityIncident::from(NewIncident {
            title: "Phishing campaign".to_string(),
            severity: Some("High".to_string()),
            status: Some("In Progress".to_string()),
            description: "Credential harvesting emails".to_string(),
            reported_by: "soc".to_string(),
            date: Some("2024-03-14".to_string()),
        })
    }

    #[test]
    fn bogus_severity_becomes_medium() {
        let incident = SecurityIncident::from(NewIncident {
            title: "Odd alert".to_string(),
            severity: Some("Bogus".to_string()),
            status: Some("Sleeping".to_string()),
            ..Default::default()
        });

        assert_eq!(incident.severity(), Severity::Medium);
        assert_eq!(incident.status(), Status::Open);
        assert_eq!(incident.date(), crate::models::today());
    }

    #[test]
    fn update_status_ignores_unknown_values() {
        let mut incident = phishing();

        incident.update_status("Resolved");
        assert_eq!(incident.status(), Status::Resolved);

        incident.update_status("Archived");
        assert_eq!(incident.status(), Status::Resolved);
    }

    #[test]
    fn dict_round_trip_is_stable() {
        let incident = phishing().with_id(7);
        let dict = incident.to_dict();

        let rebuilt = SecurityIncident::from_record(dict.clone()).unwrap();
        assert_eq!(rebuilt, incident);
        assert_eq!(rebuilt.to_dict(), dict);
    }

    #[test]
    fn stored_row_with_nulls_decodes() {
        let row = serde_json::json!({
            "id": 3,
            "title": "Port scan",
            "severity": "Critical",
            "status": "Closed",
            "description": null,
            "reported_by": null,
            "date": "2024-01-02",
            "created_at": "2024-01-02 10:00:00"
        });
        let serde_json::Value::Object(record) = row else {
            unreachable!()
        };

        let incident = SecurityIncident::from_record(record).unwrap();
        assert_eq!(incident.id(), Some(3));
        assert_eq!(incident.description(), "");
        assert_eq!(incident.severity_level(), 4);
    }

    #[test]
    fn unsaved_incident_has_no_id_column() {
        let record = phishing().to_record();
        assert!(!record.contains_key("id"));
        assert_eq!(record["status"], "In Progress");
    }
}
