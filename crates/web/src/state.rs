//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;

use crate::config::AppConfig;
use crate::openai::{ChatCompletion, CompletionError, OpenAiClient};
use crate::services::persona;
use crate::services::{EmailError, EmailService, SummaryMailer};
use crate::supabase::{StoreError, SummaryQuery, SummaryRecord, SummaryStore, SupabaseStore};

/// How long an admin summary listing stays cached.
const SUMMARY_CACHE_TTL: Duration = Duration::from_secs(600);

/// Error building a configured collaborator at start-up.
#[derive(Debug, thiserror::Error)]
pub enum CollaboratorError {
    #[error("chat completion: {0}")]
    Completion(#[from] CompletionError),
    #[error("summary store: {0}")]
    Store(#[from] StoreError),
    #[error("summary mail: {0}")]
    Email(#[from] EmailError),
}

/// Optional collaborators, resolved once at start-up.
///
/// `None` means "not configured" and selects the fallback path (demo
/// replies, no persistence, no mail). Nothing is re-probed per request.
#[derive(Clone, Default)]
pub struct Collaborators {
    pub chat: Option<Arc<dyn ChatCompletion>>,
    pub store: Option<Arc<dyn SummaryStore>>,
    pub mailer: Option<Arc<dyn SummaryMailer>>,
}

impl Collaborators {
    /// Build the real clients for every configured collaborator.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured collaborator cannot be constructed.
    pub fn from_config(config: &AppConfig) -> Result<Self, CollaboratorError> {
        let chat = match &config.openai {
            Some(openai) => {
                let client = OpenAiClient::new(openai)?;
                tracing::info!(model = client.model(), "Chat completion enabled");
                Some(Arc::new(client) as Arc<dyn ChatCompletion>)
            }
            None => None,
        };
        let store = match &config.supabase {
            Some(supabase) => {
                Some(Arc::new(SupabaseStore::new(supabase)?) as Arc<dyn SummaryStore>)
            }
            None => None,
        };
        let mailer = match &config.email {
            Some(email) => Some(Arc::new(EmailService::new(email)?) as Arc<dyn SummaryMailer>),
            None => None,
        };

        Ok(Self {
            chat,
            store,
            mailer,
        })
    }
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    persona: String,
    collaborators: Collaborators,
    summary_cache: Cache<SummaryQuery, Arc<Vec<SummaryRecord>>>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// The persona prompt is read from `config.persona_file` now and kept for
    /// the life of the process.
    #[must_use]
    pub fn new(config: AppConfig, collaborators: Collaborators) -> Self {
        let persona = persona::load_persona(config.persona_file.as_deref());
        let summary_cache = Cache::builder()
            .max_capacity(100)
            .time_to_live(SUMMARY_CACHE_TTL)
            .build();

        Self {
            inner: Arc::new(AppStateInner {
                config,
                persona,
                collaborators,
                summary_cache,
            }),
        }
    }

    /// Get a reference to the application configuration.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// System prompt for persona replies.
    #[must_use]
    pub fn persona(&self) -> &str {
        &self.inner.persona
    }

    /// Chat-completion collaborator, if configured.
    #[must_use]
    pub fn chat(&self) -> Option<&dyn ChatCompletion> {
        self.inner.collaborators.chat.as_deref()
    }

    /// Summary store, if configured.
    #[must_use]
    pub fn store(&self) -> Option<&dyn SummaryStore> {
        self.inner.collaborators.store.as_deref()
    }

    /// Summary mailer, if configured.
    #[must_use]
    pub fn mailer(&self) -> Option<&dyn SummaryMailer> {
        self.inner.collaborators.mailer.as_deref()
    }

    /// Cache of admin summary listings.
    #[must_use]
    pub fn summary_cache(&self) -> &Cache<SummaryQuery, Arc<Vec<SummaryRecord>>> {
        &self.inner.summary_cache
    }
}
