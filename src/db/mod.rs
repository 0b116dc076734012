use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::models::{Dataset, ItTicket, SecurityIncident};

pub mod migrator;
pub mod record;
pub mod repositories;

pub use record::{Record, StoreError};
pub use repositories::Repository;
pub use repositories::dataset::DatasetFilter;
pub use repositories::incident::IncidentFilter;
pub use repositories::ticket::TicketFilter;
pub use repositories::user::UserRepository;

/// Shared handle to the embedded database.
///
/// Cloning is cheap; every clone draws from the same connection pool.
#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let in_memory = db_url.contains(":memory:");

        if !in_memory {
            let path_str = db_url.trim_start_matches("sqlite://").trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        // Each connection to `:memory:` opens a separate database
        let (max_connections, min_connections) = if in_memory {
            (1, 1)
        } else {
            (max_connections.max(1), min_connections.min(max_connections.max(1)))
        };

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .sqlx_logging(false);

        if !in_memory {
            opt.idle_timeout(Duration::from_secs(300))
                .max_lifetime(Duration::from_secs(600));
        }

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    #[must_use]
    pub fn incidents(&self) -> Repository<SecurityIncident> {
        Repository::new(self.clone())
    }

    #[must_use]
    pub fn datasets(&self) -> Repository<Dataset> {
        Repository::new(self.clone())
    }

    #[must_use]
    pub fn tickets(&self) -> Repository<ItTicket> {
        Repository::new(self.clone())
    }

    #[must_use]
    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.clone())
    }
}
