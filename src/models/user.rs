use anyhow::Result;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use super::{UnknownVariant, null_as_default, null_as_now};
use crate::config::SecurityConfig;
use crate::db::Record;
use crate::services::credentials;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            other => Err(UnknownVariant {
                kind: "role",
                value: other.to_string(),
                expected: "user, admin".to_string(),
            }),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(value.and_then(|v| v.parse().ok()).unwrap_or_default())
    }
}

/// An account allowed to sign in.
///
/// The password digest is readable only through this type's own methods;
/// its serialized and debug forms leave the digest out.
#[derive(Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<i64>,
    username: String,
    #[serde(default, skip_serializing, deserialize_with = "null_as_default")]
    password_hash: String,
    #[serde(default)]
    role: Role,
    #[serde(default = "super::now_timestamp", deserialize_with = "null_as_now")]
    created_at: String,
}

impl User {
    /// Creates an unsaved account with `password` hashed under `config`.
    pub fn register(
        username: impl Into<String>,
        password: &str,
        role: Role,
        config: &SecurityConfig,
    ) -> Result<Self> {
        Ok(Self {
            id: None,
            username: username.into(),
            password_hash: credentials::hash_password(password, config)?,
            role,
            created_at: super::now_timestamp(),
        })
    }

    pub fn from_record(record: Record) -> Result<Self, serde_json::Error> {
        serde_json::from_value(serde_json::Value::Object(record))
    }

    #[must_use]
    pub const fn id(&self) -> Option<i64> {
        self.id
    }

    #[must_use]
    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub fn created_at(&self) -> &str {
        &self.created_at
    }

    #[must_use]
    pub fn verify_password(&self, password: &str) -> bool {
        !self.password_hash.is_empty() && credentials::verify_password(password, &self.password_hash)
    }

    /// Replaces the digest with a fresh hash of `password`.
    pub fn rehash(&mut self, password: &str, config: &SecurityConfig) -> Result<()> {
        self.password_hash = credentials::hash_password(password, config)?;
        Ok(())
    }

    /// Public fields only.
    #[must_use]
    pub fn to_dict(&self) -> Record {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => Record::new(),
        }
    }

    /// Every stored column, digest included.
    pub(crate) fn to_storage_record(&self) -> Record {
        let mut record = self.to_dict();
        record.insert(
            "password_hash".to_string(),
            self.password_hash.clone().into(),
        );
        record
    }

    pub(crate) fn password_record(&self) -> Record {
        let mut record = Record::new();
        record.insert(
            "password_hash".to_string(),
            self.password_hash.clone().into(),
        );
        record
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("password_hash", &"<redacted>")
            .field("role", &self.role)
            .field("created_at", &self.created_at)
            .finish()
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "User(id={}, username='{}', role='{}')",
            self.id.map_or_else(|| "-".to_string(), |id| id.to_string()),
            self.username,
            self.role
        )
    }
}
