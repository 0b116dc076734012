use sea_orm::Value;

use super::{Cmp, Repository};
use crate::db::StoreError;
use crate::models::{ItTicket, Priority, Status};

#[derive(Debug, Clone, Copy, Default)]
pub struct TicketFilter {
    pub status: Option<Status>,
    pub priority: Option<Priority>,
}

impl Repository<ItTicket> {
    /// Most recently opened first.
    pub async fn list(&self, filter: TicketFilter) -> Result<Vec<ItTicket>, StoreError> {
        let mut conditions: Vec<(&str, Cmp, Value)> = Vec::new();
        if let Some(status) = filter.status {
            conditions.push(("status", Cmp::Eq, status.as_str().into()));
        }
        if let Some(priority) = filter.priority {
            conditions.push(("priority", Cmp::Eq, priority.as_str().into()));
        }

        self.list_where(&conditions, "created_date DESC, id DESC").await
    }

    pub async fn update_status(
        &self,
        id: i64,
        status: Status,
    ) -> Result<Option<ItTicket>, StoreError> {
        self.modify(id, "status", |ticket| ticket.update_status(status.as_str()))
            .await
    }

    pub async fn assign(&self, id: i64, staff_name: &str) -> Result<Option<ItTicket>, StoreError> {
        self.modify(id, "assigned_to", |ticket| ticket.assign_to(staff_name))
            .await
    }

    pub async fn close(&self, id: i64) -> Result<Option<ItTicket>, StoreError> {
        self.modify(id, "status", ItTicket::close_ticket).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Store;
    use crate::models::{DomainRecord, NewTicket};

    async fn store_with_ticket() -> (Store, i64) {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let ticket = ItTicket::from(NewTicket {
            title: "Laptop won't boot".to_string(),
            priority: Some("High".to_string()),
            created_date: Some("2024-04-10".to_string()),
            ..Default::default()
        });
        let id = store.tickets().create(ticket).await.unwrap().id().unwrap();
        (store, id)
    }

    #[tokio::test]
    async fn assign_then_close() {
        let (store, id) = store_with_ticket().await;
        let repo = store.tickets();

        let assigned = repo.assign(id, "desk 4").await.unwrap().unwrap();
        assert_eq!(assigned.assigned_to(), "desk 4");
        assert_eq!(assigned.status(), Status::Open);

        repo.close(id).await.unwrap();
        let loaded = repo.get(id).await.unwrap().unwrap();
        assert_eq!(loaded.status(), Status::Closed);
        assert_eq!(loaded.assigned_to(), "desk 4");
    }

    #[tokio::test]
    async fn filters_combine() {
        let (store, id) = store_with_ticket().await;
        let repo = store.tickets();
        repo.create(ItTicket::from(NewTicket {
            title: "Password reset".to_string(),
            priority: Some("Low".to_string()),
            created_date: Some("2024-04-12".to_string()),
            ..Default::default()
        }))
        .await
        .unwrap();

        repo.update_status(id, Status::InProgress).await.unwrap();

        let all = repo.list(TicketFilter::default()).await.unwrap();
        assert_eq!(all[0].title(), "Password reset");

        let busy_high = repo
            .list(TicketFilter {
                status: Some(Status::InProgress),
                priority: Some(Priority::High),
            })
            .await
            .unwrap();
        assert_eq!(busy_high.len(), 1);
        assert_eq!(busy_high[0].id(), Some(id));
    }

    #[tokio::test]
    async fn missing_ticket_is_none() {
        let (store, _) = store_with_ticket().await;
        assert!(store.tickets().close(4242).await.unwrap().is_none());
        assert!(store.tickets().assign(4242, "x").await.unwrap().is_none());
    }
}
