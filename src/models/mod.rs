//! Typed, validated in-memory representations of stored rows.

pub mod dataset;
pub mod incident;
pub mod levels;
pub mod ticket;
pub mod user;

pub use dataset::{Dataset, NewDataset};
pub use incident::{NewIncident, SecurityIncident};
pub use levels::{Level, Priority, Severity, Status, UnknownVariant};
pub use ticket::{ItTicket, NewTicket};
pub use user::{Role, User};

use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};

use crate::db::Record;

/// An entity persisted as one row of a named table.
///
/// Serialization defines the stored columns; `id` is omitted while unset so
/// the database assigns it.
pub trait DomainRecord: Serialize + DeserializeOwned + Send + Sync {
    const TABLE: &'static str;

    fn id(&self) -> Option<i64>;

    #[must_use]
    fn with_id(self, id: i64) -> Self;

    /// Column values for persistence.
    fn to_record(&self) -> Record {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => Record::new(),
        }
    }

    /// Presentation mapping, including any derived values.
    fn to_dict(&self) -> Record {
        self.to_record()
    }

    /// Rebuilds an entity from a stored row or a previous [`Self::to_dict`].
    ///
    /// Unknown keys are ignored.
    fn from_record(record: Record) -> Result<Self, serde_json::Error> {
        serde_json::from_value(serde_json::Value::Object(record))
    }
}

/// Reads SQL NULL as the type's default.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

pub(crate) fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

pub(crate) fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

pub(crate) fn null_as_today<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?
        .filter(|s| !s.is_empty())
        .unwrap_or_else(today))
}

pub(crate) fn null_as_now<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?
        .filter(|s| !s.is_empty())
        .unwrap_or_else(now_timestamp))
}
