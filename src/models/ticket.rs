use serde::{Deserialize, Serialize};
use std::fmt;

use super::{DomainRecord, Priority, Status, null_as_default, null_as_now, null_as_today};

/// An IT support ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItTicket {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    title: String,
    #[serde(default)]
    priority: Priority,
    #[serde(default)]
    status: Status,
    #[serde(default, deserialize_with = "null_as_default")]
    assigned_to: String,
    #[serde(default, deserialize_with = "null_as_default")]
    description: String,
    #[serde(default = "super::today", deserialize_with = "null_as_today")]
    created_date: String,
    #[serde(default = "super::now_timestamp", deserialize_with = "null_as_now")]
    created_at: String,
}

/// Fields accepted when opening a ticket.
///
/// Priority and status are free text; unrecognised values fall back to
/// Medium and Open.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewTicket {
    pub title: String,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub assigned_to: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub created_date: Option<String>,
}

impl From<NewTicket> for ItTicket {
    fn from(input: NewTicket) -> Self {
        Self {
            id: None,
            title: input.title,
            priority: input
                .priority
                .as_deref()
                .map(Priority::parse_lenient)
                .unwrap_or_default(),
            status: input
                .status
                .as_deref()
                .map(Status::parse_lenient)
                .unwrap_or_default(),
            assigned_to: input.assigned_to,
            description: input.description,
            created_date: input
                .created_date
                .filter(|d| !d.is_empty())
                .unwrap_or_else(super::today),
            created_at: super::now_timestamp(),
        }
    }
}

impl ItTicket {
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub const fn priority(&self) -> Priority {
        self.priority
    }

    #[must_use]
    pub const fn status(&self) -> Status {
        self.status
    }

    #[must_use]
    pub fn assigned_to(&self) -> &str {
        &self.assigned_to
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn created_date(&self) -> &str {
        &self.created_date
    }

    #[must_use]
    pub fn created_at(&self) -> &str {
        &self.created_at
    }

    #[must_use]
    pub const fn priority_level(&self) -> u8 {
        self.priority.rank()
    }

    pub fn assign_to(&mut self, staff_name: impl Into<String>) {
        self.assigned_to = staff_name.into();
    }

    pub fn close_ticket(&mut self) {
        self.status = Status::Closed;
    }

    /// Moves the ticket to `new_status`. Unrecognised labels are ignored.
    pub fn update_status(&mut self, new_status: &str) {
        if let Ok(status) = new_status.parse() {
            self.status = status;
        }
    }
}

impl DomainRecord for ItTicket {
    const TABLE: &'static str = "it_tickets";

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }
}

impl fmt::Display for ItTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ItTicket(id={}, title='{}', priority='{}', status='{}')",
            self.id.map_or_else(|| "-".to_string(), |id| id.to_string()),
            self.title,
            self.priority,
            self.status
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vpn_ticket() -> ItTicket {
        ItTicket::from(NewTicket {
            title: "VPN drops".to_string(),
            priority: Some("Critical".to_string()),
            assigned_to: "netops".to_string(),
            created_date: Some("2024-06-01".to_string()),
            ..Default::default()
        })
    }

    #[test]
    fn defaults_apply_to_unknown_labels() {
        let ticket = ItTicket::from(NewTicket {
            title: "Keyboard".to_string(),
            priority: Some("ASAP".to_string()),
            status: Some("Waiting".to_string()),
            ..Default::default()
        });

        assert_eq!(ticket.priority(), Priority::Medium);
        assert_eq!(ticket.status(), Status::Open);
        assert_eq!(ticket.priority_level(), 2);
    }

    #[test]
    fn transitions_touch_only_their_field() {
        let mut ticket = vpn_ticket();

        ticket.assign_to("desk 2");
        assert_eq!(ticket.assigned_to(), "desk 2");
        assert_eq!(ticket.status(), Status::Open);

        ticket.update_status("In Progress");
        assert_eq!(ticket.status(), Status::InProgress);

        ticket.update_status("Escalated");
        assert_eq!(ticket.status(), Status::InProgress);

        ticket.close_ticket();
        assert_eq!(ticket.status(), Status::Closed);
        assert_eq!(ticket.priority(), Priority::Critical);
    }

    #[test]
    fn dict_round_trip_is_stable() {
        let ticket = vpn_ticket().with_id(11);
        let dict = ticket.to_dict();
        let rebuilt = ItTicket::from_record(dict.clone()).unwrap();

        assert_eq!(rebuilt, ticket);
        assert_eq!(rebuilt.to_dict(), dict);
    }
}
