//! Generic keyed CRUD over named tables.
//!
//! Every table carries an integer primary key `id`. Values are always bound
//! as statement parameters; table and column names cannot be bound, so they
//! are checked against a strict identifier grammar before being spliced in.

use sea_orm::{
    ConnectionTrait, DbErr, FromQueryResult, JsonValue, SqlErr, Statement, Value,
};
use thiserror::Error;
use tracing::debug;

use super::Store;

/// A row-shaped mapping from column name to value.
pub type Record = serde_json::Map<String, JsonValue>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("No fields supplied for {0}")]
    EmptyFields(&'static str),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Failed to decode record: {0}")]
    Decode(String),
}

impl From<DbErr> for StoreError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(msg)) => Self::ConstraintViolation(msg),
            Some(SqlErr::ForeignKeyConstraintViolation(msg)) => Self::ConstraintViolation(msg),
            _ => {
                let msg = err.to_string();
                // NOT NULL / CHECK failures are not classified by sea-orm
                if msg.contains("constraint failed") {
                    Self::ConstraintViolation(msg)
                } else {
                    Self::Database(msg)
                }
            }
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Accepts `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn checked_identifier(name: &str) -> Result<&str, StoreError> {
    if is_valid_identifier(name) {
        Ok(name)
    } else {
        Err(StoreError::InvalidIdentifier(name.to_string()))
    }
}

/// Converts a JSON field value into a bindable parameter.
///
/// Nested arrays and objects are stored as their JSON text.
#[must_use]
pub fn to_param(value: &JsonValue) -> Value {
    match value {
        JsonValue::Null => Option::<String>::None.into(),
        JsonValue::Bool(b) => (*b).into(),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.into()
            } else if let Some(f) = n.as_f64() {
                f.into()
            } else {
                n.to_string().into()
            }
        }
        JsonValue::String(s) => s.clone().into(),
        other => other.to_string().into(),
    }
}

fn into_record(value: JsonValue) -> Record {
    match value {
        JsonValue::Object(map) => map,
        _ => Record::new(),
    }
}

impl Store {
    fn statement(&self, sql: &str, params: Vec<Value>) -> Statement {
        Statement::from_sql_and_values(self.conn.get_database_backend(), sql, params)
    }

    /// Runs `sql` and returns the first row, if any.
    pub async fn fetch_one(
        &self,
        sql: &str,
        params: Vec<Value>,
    ) -> Result<Option<Record>, StoreError> {
        let row = JsonValue::find_by_statement(self.statement(sql, params))
            .one(&self.conn)
            .await?;

        Ok(row.map(into_record))
    }

    /// Runs `sql` and returns every row in the order the query produces.
    pub async fn fetch_all(&self, sql: &str, params: Vec<Value>) -> Result<Vec<Record>, StoreError> {
        let rows = JsonValue::find_by_statement(self.statement(sql, params))
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(into_record).collect())
    }

    /// Inserts one row and returns its generated id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ConstraintViolation`] when a unique or not-null
    /// constraint rejects the row.
    pub async fn insert(&self, table: &str, fields: &Record) -> Result<i64, StoreError> {
        let table = checked_identifier(table)?;
        if fields.is_empty() {
            return Err(StoreError::EmptyFields("insert"));
        }

        let mut columns = Vec::with_capacity(fields.len());
        let mut params = Vec::with_capacity(fields.len());
        for (column, value) in fields {
            columns.push(checked_identifier(column)?);
            params.push(to_param(value));
        }

        let placeholders = vec!["?"; columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO {table} ({}) VALUES ({placeholders})",
            columns.join(", ")
        );

        let result = self.conn.execute(self.statement(&sql, params)).await?;
        let id = i64::try_from(result.last_insert_id())
            .map_err(|_| StoreError::Database("Inserted row id out of range".to_string()))?;

        debug!(table, id, "Inserted record");
        Ok(id)
    }

    /// Updates a subset of columns on the row with `id`.
    ///
    /// Returns `false` when no row matched.
    pub async fn update(&self, table: &str, id: i64, fields: &Record) -> Result<bool, StoreError> {
        let table = checked_identifier(table)?;
        if fields.is_empty() {
            return Err(StoreError::EmptyFields("update"));
        }

        let mut assignments = Vec::with_capacity(fields.len());
        let mut params = Vec::with_capacity(fields.len() + 1);
        for (column, value) in fields {
            assignments.push(format!("{} = ?", checked_identifier(column)?));
            params.push(to_param(value));
        }
        params.push(id.into());

        let sql = format!("UPDATE {table} SET {} WHERE id = ?", assignments.join(", "));
        let result = self.conn.execute(self.statement(&sql, params)).await?;

        debug!(table, id, rows = result.rows_affected(), "Updated record");
        Ok(result.rows_affected() > 0)
    }

    /// Deletes the row with `id`. Returns `false` when no row matched.
    pub async fn delete(&self, table: &str, id: i64) -> Result<bool, StoreError> {
        let table = checked_identifier(table)?;
        let sql = format!("DELETE FROM {table} WHERE id = ?");
        let result = self.conn.execute(self.statement(&sql, vec![id.into()])).await?;

        debug!(table, id, rows = result.rows_affected(), "Deleted record");
        Ok(result.rows_affected() > 0)
    }

    /// Runs an aggregate query whose single column is named `value`.
    pub async fn fetch_scalar(&self, sql: &str, params: Vec<Value>) -> Result<i64, StoreError> {
        let row = self.conn.query_one(self.statement(sql, params)).await?;

        match row {
            Some(row) => Ok(row.try_get::<Option<i64>>("", "value")?.unwrap_or(0)),
            None => Ok(0),
        }
    }

    pub async fn count(&self, table: &str) -> Result<i64, StoreError> {
        let table = checked_identifier(table)?;
        self.fetch_scalar(&format!("SELECT COUNT(*) AS value FROM {table}"), vec![])
            .await
    }

    /// Row counts grouped by the values of `column`. NULLs are skipped.
    pub async fn count_by(
        &self,
        table: &str,
        column: &str,
    ) -> Result<Vec<(String, i64)>, StoreError> {
        let table = checked_identifier(table)?;
        let column = checked_identifier(column)?;
        let sql = format!(
            "SELECT {column} AS value, COUNT(*) AS count FROM {table} \
             WHERE {column} IS NOT NULL GROUP BY {column} ORDER BY {column}"
        );

        let rows = self.conn.query_all(self.statement(&sql, vec![])).await?;
        rows.iter()
            .map(|row| -> Result<(String, i64), StoreError> {
                Ok((
                    row.try_get::<String>("", "value")?,
                    row.try_get::<i64>("", "count")?,
                ))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn test_store() -> Store {
        Store::new("sqlite::memory:")
            .await
            .expect("failed to open in-memory store")
    }

    fn ticket_fields() -> Record {
        let mut fields = Record::new();
        fields.insert("title".into(), json!("Printer offline"));
        fields.insert("priority".into(), json!("High"));
        fields.insert("status".into(), json!("Open"));
        fields.insert("assigned_to".into(), json!("helpdesk"));
        fields.insert("description".into(), json!("Floor 3 printer"));
        fields.insert("created_date".into(), json!("2024-05-01"));
        fields.insert("created_at".into(), json!("2024-05-01T09:00:00+00:00"));
        fields
    }

    #[test]
    fn identifier_grammar() {
        assert!(is_valid_identifier("it_tickets"));
        assert!(is_valid_identifier("_private"));
        assert!(is_valid_identifier("col2"));
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("2col"));
        assert!(!is_valid_identifier("users; DROP TABLE users"));
        assert!(!is_valid_identifier("name-with-dash"));
    }

    #[test]
    fn constraint_errors_are_classified() {
        let err: StoreError = DbErr::Custom("NOT NULL constraint failed: users.username".into()).into();
        assert!(matches!(err, StoreError::ConstraintViolation(_)));

        let err: StoreError = DbErr::Custom("disk I/O error".into()).into();
        assert!(matches!(err, StoreError::Database(_)));
    }

    #[tokio::test]
    async fn insert_fetch_delete_ticket() {
        let store = test_store().await;
        let fields = ticket_fields();

        let id = store.insert("it_tickets", &fields).await.unwrap();
        assert!(id > 0);

        let row = store
            .fetch_one("SELECT * FROM it_tickets WHERE id = ?", vec![id.into()])
            .await
            .unwrap()
            .expect("inserted row should be readable");

        assert_eq!(row.get("id"), Some(&json!(id)));
        for (column, value) in &fields {
            assert_eq!(row.get(column), Some(value), "column {column}");
        }

        assert!(store.delete("it_tickets", id).await.unwrap());
        let gone = store
            .fetch_one("SELECT * FROM it_tickets WHERE id = ?", vec![id.into()])
            .await
            .unwrap();
        assert!(gone.is_none());
    }

    #[tokio::test]
    async fn missing_rows_report_false() {
        let store = test_store().await;
        let mut fields = Record::new();
        fields.insert("status".into(), json!("Closed"));

        assert!(!store.update("it_tickets", 9999, &fields).await.unwrap());
        assert!(!store.delete("it_tickets", 9999).await.unwrap());
    }

    #[tokio::test]
    async fn partial_update_touches_only_given_columns() {
        let store = test_store().await;
        let id = store.insert("it_tickets", &ticket_fields()).await.unwrap();

        let mut fields = Record::new();
        fields.insert("assigned_to".into(), json!("network team"));
        assert!(store.update("it_tickets", id, &fields).await.unwrap());

        let row = store
            .fetch_one("SELECT * FROM it_tickets WHERE id = ?", vec![id.into()])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row["assigned_to"], json!("network team"));
        assert_eq!(row["title"], json!("Printer offline"));
    }

    #[tokio::test]
    async fn duplicate_username_is_a_constraint_violation() {
        let store = test_store().await;
        let mut fields = Record::new();
        fields.insert("username".into(), json!("alice"));
        fields.insert("password_hash".into(), json!("x"));
        fields.insert("role".into(), json!("user"));

        store.insert("users", &fields).await.unwrap();
        let err = store.insert("users", &fields).await.unwrap_err();
        assert!(matches!(err, StoreError::ConstraintViolation(_)));
    }

    #[tokio::test]
    async fn rejects_unsafe_identifiers_and_empty_fields() {
        let store = test_store().await;

        let err = store.delete("it_tickets; --", 1).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidIdentifier(_)));

        let mut fields = Record::new();
        fields.insert("title = 'x', status".into(), json!("Closed"));
        let err = store.update("it_tickets", 1, &fields).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidIdentifier(_)));

        let err = store.insert("it_tickets", &Record::new()).await.unwrap_err();
        assert!(matches!(err, StoreError::EmptyFields(_)));
    }

    #[tokio::test]
    async fn null_values_round_trip() {
        let store = test_store().await;
        let mut fields = Record::new();
        fields.insert("name".into(), json!("logs"));
        fields.insert("size".into(), JsonValue::Null);

        let id = store.insert("datasets_metadata", &fields).await.unwrap();
        let row = store
            .fetch_one(
                "SELECT * FROM datasets_metadata WHERE id = ?",
                vec![id.into()],
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row["size"], JsonValue::Null);
    }

    #[tokio::test]
    async fn counts_and_groups() {
        let store = test_store().await;
        store.insert("it_tickets", &ticket_fields()).await.unwrap();
        let mut closed = ticket_fields();
        closed.insert("status".into(), json!("Closed"));
        store.insert("it_tickets", &closed).await.unwrap();
        store.insert("it_tickets", &closed).await.unwrap();

        assert_eq!(store.count("it_tickets").await.unwrap(), 3);
        assert_eq!(
            store.count_by("it_tickets", "status").await.unwrap(),
            vec![("Closed".to_string(), 2), ("Open".to_string(), 1)]
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_writers_on_a_pooled_file_database() {
        const WRITERS: i64 = 24;

        let path = std::env::temp_dir().join(format!("intelboard-{}.db", uuid::Uuid::new_v4()));
        let url = format!("sqlite:{}", path.display());
        let store = Store::with_pool_options(&url, 5, 1).await.unwrap();

        let mut inserts = tokio::task::JoinSet::new();
        for i in 0..WRITERS {
            let store = store.clone();
            inserts.spawn(async move {
                let mut fields = ticket_fields();
                fields.insert("title".into(), json!(format!("ticket {i}")));
                store.insert("it_tickets", &fields).await
            });
        }

        let mut ids = Vec::new();
        while let Some(joined) = inserts.join_next().await {
            ids.push(joined.unwrap().unwrap());
        }
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len() as i64, WRITERS);
        assert_eq!(store.count("it_tickets").await.unwrap(), WRITERS);

        let mut updates = tokio::task::JoinSet::new();
        for id in ids {
            let store = store.clone();
            updates.spawn(async move {
                let mut fields = Record::new();
                fields.insert("status".into(), json!("Resolved"));
                store.update("it_tickets", id, &fields).await
            });
        }
        while let Some(joined) = updates.join_next().await {
            assert!(joined.unwrap().unwrap());
        }

        assert_eq!(
            store.count_by("it_tickets", "status").await.unwrap(),
            vec![("Resolved".to_string(), WRITERS)]
        );

        store.conn.close().await.unwrap();
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{suffix}", path.display()));
        }
    }
}
