//! Enumerated fields shared by incidents and tickets.
//!
//! Construction from free text is lenient: an unrecognised value becomes the
//! field's default. Strict parsing is available through [`std::str::FromStr`]
//! for callers that want to reject bad input instead.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown {kind} '{value}' (expected one of: {expected})")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
    pub expected: String,
}

/// Severity of an incident or priority of a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Level {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

pub type Severity = Level;
pub type Priority = Level;

impl Level {
    pub const ALL: [Self; 4] = [Self::Low, Self::Medium, Self::High, Self::Critical];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
        }
    }

    /// Numeric rank, 1 (Low) through 4 (Critical).
    #[must_use]
    pub const fn rank(&self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
            Self::Critical => 4,
        }
    }

    /// Parses `value`, substituting [`Level::Medium`] when it is not recognised.
    #[must_use]
    pub fn parse_lenient(value: &str) -> Self {
        value.parse().unwrap_or_else(|_| {
            debug!(value, "Unrecognised level, using default");
            Self::default()
        })
    }
}

impl FromStr for Level {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|level| level.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                kind: "level",
                value: s.to_string(),
                expected: Self::ALL.map(|l| l.as_str()).join(", "),
            })
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Level {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Level {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(value.as_deref().map(Self::parse_lenient).unwrap_or_default())
    }
}

/// Workflow status of an incident or ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Status {
    #[default]
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl Status {
    pub const ALL: [Self; 4] = [Self::Open, Self::InProgress, Self::Resolved, Self::Closed];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::InProgress => "In Progress",
            Self::Resolved => "Resolved",
            Self::Closed => "Closed",
        }
    }

    /// Open and In Progress items still need attention.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Open | Self::InProgress)
    }

    /// Parses `value`, substituting [`Status::Open`] when it is not recognised.
    #[must_use]
    pub fn parse_lenient(value: &str) -> Self {
        value.parse().unwrap_or_else(|_| {
            debug!(value, "Unrecognised status, using default");
            Self::default()
        })
    }
}

impl FromStr for Status {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                kind: "status",
                value: s.to_string(),
                expected: Self::ALL.map(|st| st.as_str()).join(", "),
            })
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Status {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(value.as_deref().map(Self::parse_lenient).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_parse_matches_exact_labels() {
        assert_eq!("Critical".parse::<Level>(), Ok(Level::Critical));
        assert_eq!("In Progress".parse::<Status>(), Ok(Status::InProgress));
        assert!("critical".parse::<Level>().is_err());
        assert!("InProgress".parse::<Status>().is_err());
    }

    #[test]
    fn lenient_parse_substitutes_defaults() {
        assert_eq!(Level::parse_lenient("Bogus"), Level::Medium);
        assert_eq!(Status::parse_lenient(""), Status::Open);
        assert_eq!(Status::parse_lenient("Resolved"), Status::Resolved);
    }

    #[test]
    fn serde_uses_display_labels() {
        let json = serde_json::to_string(&Status::InProgress).unwrap();
        assert_eq!(json, "\"In Progress\"");

        let status: Status = serde_json::from_str("\"Nope\"").unwrap();
        assert_eq!(status, Status::Open);

        let level: Level = serde_json::from_str("null").unwrap();
        assert_eq!(level, Level::Medium);
    }

    #[test]
    fn ranks_are_one_based() {
        let ranks: Vec<u8> = Level::ALL.iter().map(Level::rank).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4]);
    }

    #[test]
    fn unknown_variant_lists_expected_values() {
        let err = "Urgent".parse::<Level>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unknown level 'Urgent' (expected one of: Low, Medium, High, Critical)"
        );
    }
}
