//! Domain-aware chat assistant with per-session conversation history.
//!
//! Failures never surface as errors: the caller always gets text to show,
//! and a failed exchange leaves the history untouched.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::clients::openai::{ChatBackend, ChatMessage};
use crate::models::{Dataset, SecurityIncident};

const GENERAL_PROMPT: &str = "You are a helpful assistant for a Multi-Domain Intelligence Platform. \
You can assist with Cybersecurity, Data Science, IT Operations, and general questions. \
Provide concise, helpful responses.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssistantDomain {
    Cybersecurity,
    #[serde(rename = "datascience")]
    DataScience,
    #[serde(rename = "itops")]
    ItOps,
    #[default]
    General,
}

impl AssistantDomain {
    /// Unknown tags select the general assistant.
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "cybersecurity" => Self::Cybersecurity,
            "datascience" => Self::DataScience,
            "itops" => Self::ItOps,
            _ => Self::General,
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cybersecurity => "cybersecurity",
            Self::DataScience => "datascience",
            Self::ItOps => "itops",
            Self::General => "general",
        }
    }

    #[must_use]
    pub const fn system_prompt(&self) -> &'static str {
        match self {
            Self::Cybersecurity => {
                "You are a cybersecurity expert. Provide security advice, incident analysis, and best practices."
            }
            Self::DataScience => {
                "You are a data science expert. Help with data analysis, visualization, and machine learning questions."
            }
            Self::ItOps => {
                "You are an IT operations expert. Assist with system administration, troubleshooting, and IT support."
            }
            Self::General => GENERAL_PROMPT,
        }
    }
}

impl fmt::Display for AssistantDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60 * 60);

struct Conversation {
    messages: Vec<ChatMessage>,
    last_used: Instant,
}

pub struct AssistantService {
    backend: Option<Arc<dyn ChatBackend>>,
    histories: RwLock<HashMap<String, Conversation>>,
    context_messages: usize,
    history_limit: usize,
    idle_timeout: Duration,
    api_key_env: String,
}

impl AssistantService {
    /// `backend` is `None` when no API key is available.
    #[must_use]
    pub fn new(
        backend: Option<Arc<dyn ChatBackend>>,
        context_messages: usize,
        history_limit: usize,
        api_key_env: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            histories: RwLock::new(HashMap::new()),
            context_messages,
            history_limit: history_limit.max(2),
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            api_key_env: api_key_env.into(),
        }
    }

    /// Conversations untouched for longer than `timeout` are dropped.
    ///
    /// Match this to the session expiry so history never outlives its session.
    #[must_use]
    pub const fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    fn is_idle(&self, conversation: &Conversation, now: Instant) -> bool {
        now.duration_since(conversation.last_used) > self.idle_timeout
    }

    /// Drops idle conversations and returns how many were removed.
    pub async fn evict_idle(&self) -> usize {
        let mut histories = self.histories.write().await;
        self.evict_idle_locked(&mut histories, Instant::now())
    }

    fn evict_idle_locked(
        &self,
        histories: &mut HashMap<String, Conversation>,
        now: Instant,
    ) -> usize {
        let before = histories.len();
        histories.retain(|_, conversation| !self.is_idle(conversation, now));
        let evicted = before - histories.len();
        if evicted > 0 {
            debug!(evicted, "Dropped idle assistant conversations");
        }
        evicted
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.backend.is_some()
    }

    /// Sends `message` in the context of `session`'s recent history.
    ///
    /// Returns the reply, or a readable explanation when the assistant is
    /// unconfigured or the request fails.
    pub async fn send_message(
        &self,
        session: &str,
        message: &str,
        domain: AssistantDomain,
    ) -> String {
        let Some(backend) = &self.backend else {
            return format!(
                "AI Assistant is not configured. Please set {} in .env file.",
                self.api_key_env
            );
        };

        let mut messages = vec![ChatMessage::system(domain.system_prompt())];
        {
            let histories = self.histories.read().await;
            if let Some(conversation) = histories.get(session)
                && !self.is_idle(conversation, Instant::now())
            {
                let history = &conversation.messages;
                let skip = history.len().saturating_sub(self.context_messages);
                messages.extend(history[skip..].iter().cloned());
            }
        }
        messages.push(ChatMessage::user(message));

        match backend.complete(&messages).await {
            Ok(reply) => {
                metrics::counter!("assistant_requests_total", "domain" => domain.as_str(), "outcome" => "success")
                    .increment(1);
                info!(%domain, "Assistant replied");

                let now = Instant::now();
                let mut histories = self.histories.write().await;
                self.evict_idle_locked(&mut histories, now);

                let conversation =
                    histories
                        .entry(session.to_string())
                        .or_insert_with(|| Conversation {
                            messages: Vec::new(),
                            last_used: now,
                        });
                conversation.last_used = now;
                let history = &mut conversation.messages;
                history.push(ChatMessage::user(message));
                history.push(ChatMessage::assistant(reply.clone()));
                if history.len() > self.history_limit {
                    let excess = history.len() - self.history_limit;
                    history.drain(..excess);
                }

                reply
            }
            Err(err) => {
                metrics::counter!("assistant_requests_total", "domain" => domain.as_str(), "outcome" => "error")
                    .increment(1);
                warn!(%domain, "Assistant request failed: {err:#}");
                format!("Error getting AI response: {err}")
            }
        }
    }

    pub async fn analyze_incident(&self, session: &str, incident: &SecurityIncident) -> String {
        if !self.is_configured() {
            return "AI Assistant not available for incident analysis.".to_string();
        }

        let description = non_empty(incident.description(), "No description");
        let prompt = format!(
            "Analyze this cybersecurity incident and provide recommendations:\n\n\
             Incident Details:\n\
             - Title: {}\n\
             - Severity: {}\n\
             - Status: {}\n\
             - Description: {description}\n\n\
             Provide:\n\
             1. Risk assessment\n\
             2. Immediate actions\n\
             3. Long-term prevention strategies\n\
             4. Compliance considerations",
            non_empty(incident.title(), "Unknown"),
            incident.severity(),
            incident.status(),
        );

        self.send_message(session, &prompt, AssistantDomain::Cybersecurity)
            .await
    }

    pub async fn analyze_dataset(&self, session: &str, dataset: &Dataset) -> String {
        if !self.is_configured() {
            return "AI Assistant not available for dataset analysis.".to_string();
        }

        let prompt = format!(
            "Analyze this dataset and provide data science insights:\n\n\
             Dataset Details:\n\
             - Name: {}\n\
             - Category: {}\n\
             - Size: {} bytes\n\
             - Description: {}\n\n\
             Provide:\n\
             1. Potential analysis approaches\n\
             2. Visualization suggestions\n\
             3. Machine learning use cases\n\
             4. Data quality considerations",
            non_empty(dataset.name(), "Unknown"),
            non_empty(dataset.category(), "Unknown"),
            dataset.size(),
            non_empty(dataset.description(), "No description"),
        );

        self.send_message(session, &prompt, AssistantDomain::DataScience)
            .await
    }

    pub async fn history(&self, session: &str) -> Vec<ChatMessage> {
        let histories = self.histories.read().await;
        histories
            .get(session)
            .filter(|conversation| !self.is_idle(conversation, Instant::now()))
            .map(|conversation| conversation.messages.clone())
            .unwrap_or_default()
    }

    /// Number of conversations currently held in memory.
    pub async fn conversation_count(&self) -> usize {
        self.histories.read().await.len()
    }

    pub async fn clear_history(&self, session: &str) {
        self.histories.write().await.remove(session);
    }
}

fn non_empty<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}
