use sea_orm::Value;
use std::marker::PhantomData;

use super::{Record, Store, StoreError};
use crate::models::DomainRecord;

pub mod dataset;
pub mod incident;
pub mod ticket;
pub mod user;

/// Typed access to the table backing `E`.
pub struct Repository<E> {
    store: Store,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for Repository<E> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            _entity: PhantomData,
        }
    }
}

/// Comparison used by a list condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Cmp {
    Eq,
    AtLeast,
}

impl Cmp {
    const fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => " = ?",
            Self::AtLeast => " >= ?",
        }
    }
}

impl<E: DomainRecord> Repository<E> {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self {
            store,
            _entity: PhantomData,
        }
    }

    pub async fn get(&self, id: i64) -> Result<Option<E>, StoreError> {
        let sql = format!("SELECT * FROM {} WHERE id = ?", E::TABLE);
        self.store
            .fetch_one(&sql, vec![id.into()])
            .await?
            .map(E::from_record)
            .transpose()
            .map_err(StoreError::from)
    }

    /// Persists a new entity and returns it with its assigned id.
    pub async fn create(&self, entity: E) -> Result<E, StoreError> {
        let mut fields = entity.to_record();
        fields.remove("id");

        let id = self.store.insert(E::TABLE, &fields).await?;
        Ok(entity.with_id(id))
    }

    pub async fn update_fields(&self, id: i64, fields: &Record) -> Result<bool, StoreError> {
        self.store.update(E::TABLE, id, fields).await
    }

    pub async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        self.store.delete(E::TABLE, id).await
    }

    pub async fn count(&self) -> Result<i64, StoreError> {
        self.store.count(E::TABLE).await
    }

    pub async fn count_by(&self, column: &str) -> Result<Vec<(String, i64)>, StoreError> {
        self.store.count_by(E::TABLE, column).await
    }

    /// Rows matching all `conditions`, in `order`.
    pub(crate) async fn list_where(
        &self,
        conditions: &[(&str, Cmp, Value)],
        order: &str,
    ) -> Result<Vec<E>, StoreError> {
        let mut sql = format!("SELECT * FROM {}", E::TABLE);
        let mut params = Vec::with_capacity(conditions.len());

        for (i, (column, cmp, value)) in conditions.iter().enumerate() {
            if !super::record::is_valid_identifier(column) {
                return Err(StoreError::InvalidIdentifier((*column).to_string()));
            }
            sql.push_str(if i == 0 { " WHERE " } else { " AND " });
            sql.push_str(column);
            sql.push_str(cmp.as_sql());
            params.push(value.clone());
        }

        sql.push_str(" ORDER BY ");
        sql.push_str(order);

        self.store
            .fetch_all(&sql, params)
            .await?
            .into_iter()
            .map(|row| E::from_record(row).map_err(StoreError::from))
            .collect()
    }

    /// Loads the entity, applies `change`, and writes back `column`.
    ///
    /// Returns `None` when no row has `id`.
    pub(crate) async fn modify(
        &self,
        id: i64,
        column: &str,
        change: impl FnOnce(&mut E),
    ) -> Result<Option<E>, StoreError> {
        let Some(mut entity) = self.get(id).await? else {
            return Ok(None);
        };

        change(&mut entity);

        let mut fields = Record::new();
        if let Some(value) = entity.to_record().remove(column) {
            fields.insert(column.to_string(), value);
        }

        if self.update_fields(id, &fields).await? {
            Ok(Some(entity))
        } else {
            Ok(None)
        }
    }
}
