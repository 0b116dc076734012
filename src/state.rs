use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::clients::openai::{ChatBackend, OpenAiClient};
use crate::config::Config;
use crate::db::Store;
use crate::services::{AssistantService, AuthService, DashboardService, SeaOrmAuthService};

/// Build a shared HTTP client with reasonable defaults for API calls.
/// This client should be reused across all HTTP-based services to enable
/// connection pooling and avoid socket exhaustion.
fn build_shared_http_client(timeout_seconds: u64) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_seconds))
        .user_agent("Intelboard/1.0")
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build shared HTTP client: {e}"))
}

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub auth: Arc<dyn AuthService>,

    pub assistant: Arc<AssistantService>,

    pub dashboard: Arc<DashboardService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let backend = match config.assistant.api_key() {
            Some(api_key) => {
                let http_client =
                    build_shared_http_client(config.assistant.request_timeout_seconds)?;
                let client = OpenAiClient::new(http_client, &config.assistant, api_key);
                info!(model = %config.assistant.model, "AI assistant configured");
                Some(Arc::new(client) as Arc<dyn ChatBackend>)
            }
            None => {
                warn!(
                    "AI assistant disabled: {} is not set",
                    config.assistant.api_key_env
                );
                None
            }
        };

        Ok(Self::with_backend(config, store, backend))
    }

    /// Assembles services over an already-open store.
    #[must_use]
    pub fn with_backend(
        config: Config,
        store: Store,
        backend: Option<Arc<dyn ChatBackend>>,
    ) -> Self {
        let auth = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            config.security.clone(),
        )) as Arc<dyn AuthService>;

        let assistant = Arc::new(AssistantService::new(
            backend,
            config.assistant.context_messages,
            config.assistant.history_limit,
            config.assistant.api_key_env.clone(),
        )
        .with_idle_timeout(std::time::Duration::from_secs(
            config.server.session_idle_minutes.unsigned_abs() * 60,
        )));

        let dashboard = Arc::new(DashboardService::new(store.clone()));

        Self {
            config: Arc::new(RwLock::new(config)),
            store,
            auth,
            assistant,
            dashboard,
        }
    }

    pub async fn config(&self) -> Config {
        self.config.read().await.clone()
    }
}
