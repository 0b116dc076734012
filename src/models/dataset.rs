use serde::{Deserialize, Serialize};
use std::fmt;

use super::{DomainRecord, null_as_default, null_as_now};
use crate::db::Record;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;
const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Metadata for a data science dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    source: String,
    #[serde(default, deserialize_with = "null_as_default")]
    category: String,
    /// Size in bytes; absent or NULL reads as 0.
    #[serde(default, deserialize_with = "null_as_default")]
    size: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    description: String,
    #[serde(default = "super::now_timestamp", deserialize_with = "null_as_now")]
    created_at: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewDataset {
    pub name: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub size: Option<i64>,
    #[serde(default)]
    pub description: String,
}

impl From<NewDataset> for Dataset {
    fn from(input: NewDataset) -> Self {
        Self {
            id: None,
            name: input.name,
            source: input.source,
            category: input.category,
            size: input.size.unwrap_or(0),
            description: input.description,
            created_at: super::now_timestamp(),
        }
    }
}

impl Dataset {
    /// Keeps an externally recorded creation time instead of now.
    #[must_use]
    pub(crate) fn with_created_at(mut self, created_at: String) -> Self {
        if !created_at.trim().is_empty() {
            self.created_at = created_at;
        }
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    #[must_use]
    pub const fn size(&self) -> i64 {
        self.size
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn created_at(&self) -> &str {
        &self.created_at
    }

    #[must_use]
    pub fn calculate_size_mb(&self) -> f64 {
        if self.size == 0 {
            return 0.0;
        }
        self.size as f64 / BYTES_PER_MB
    }

    #[must_use]
    pub fn calculate_size_gb(&self) -> f64 {
        if self.size == 0 {
            return 0.0;
        }
        self.size as f64 / BYTES_PER_GB
    }
}

impl DomainRecord for Dataset {
    const TABLE: &'static str = "datasets_metadata";

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    fn to_dict(&self) -> Record {
        let mut dict = self.to_record();
        dict.insert("size_mb".to_string(), self.calculate_size_mb().into());
        dict
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Dataset(id={}, name='{}', category='{}', size={} bytes)",
            self.id.map_or_else(|| "-".to_string(), |id| id.to_string()),
            self.name,
            self.category,
            self.size
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset(size: Option<i64>) -> Dataset {
        Dataset::from(NewDataset {
            name: "network_flows".to_string(),
            source: "netflow".to_string(),
            category: "Security".to_string(),
            size,
            description: String::new(),
        })
    }

    #[test]
    fn missing_size_is_zero() {
        let ds = dataset(None);
        assert_eq!(ds.size(), 0);
        assert_eq!(ds.calculate_size_mb(), 0.0);
        assert_eq!(ds.calculate_size_gb(), 0.0);
    }

    #[test]
    fn one_mebibyte() {
        let ds = dataset(Some(1_048_576));
        assert_eq!(ds.calculate_size_mb(), 1.0);
        assert_eq!(ds.calculate_size_gb(), 1.0 / 1024.0);
    }

    #[test]
    fn null_size_in_row_reads_as_zero() {
        let row = serde_json::json!({ "id": 1, "name": "x", "size": null });
        let serde_json::Value::Object(record) = row else {
            unreachable!()
        };
        let ds = Dataset::from_record(record).unwrap();
        assert_eq!(ds.size(), 0);
        assert_eq!(ds.category(), "");
    }

    #[test]
    fn dict_carries_derived_size_but_record_does_not() {
        let ds = dataset(Some(3 * 1_048_576)).with_id(2);

        assert_eq!(ds.to_dict()["size_mb"], 3.0);
        assert!(!ds.to_record().contains_key("size_mb"));

        let dict = ds.to_dict();
        let rebuilt = Dataset::from_record(dict.clone()).unwrap();
        assert_eq!(rebuilt.to_dict(), dict);
    }
}
