//! Session middleware configuration.
//!
//! Sessions are kept in process memory and are gone after a restart. The
//! store is a `moka` cache with an idle timeout, so abandoned sessions are
//! evicted instead of accumulating for the life of the process.

use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use time::OffsetDateTime;
use tower_sessions::session::{Id, Record};
use tower_sessions::session_store::{self, SessionStore};
use tower_sessions::{Expiry, SessionManagerLayer};

use crate::config::AppConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "megami_session";

/// A session untouched for this long is evicted.
pub const SESSION_IDLE_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

/// Upper bound on live sessions.
const MAX_SESSIONS: u64 = 100_000;

/// In-memory session store with idle eviction.
#[derive(Debug, Clone)]
pub struct VisitorStore {
    cache: Cache<Id, Record>,
}

impl VisitorStore {
    /// Create a store that evicts sessions idle for `idle_timeout`.
    #[must_use]
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(MAX_SESSIONS)
                .time_to_idle(idle_timeout)
                .build(),
        }
    }

    /// Number of stored sessions, after pending evictions run.
    pub async fn session_count(&self) -> u64 {
        self.cache.run_pending_tasks().await;
        self.cache.entry_count()
    }
}

impl Default for VisitorStore {
    fn default() -> Self {
        Self::new(SESSION_IDLE_TIMEOUT)
    }
}

#[async_trait]
impl SessionStore for VisitorStore {
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        // Regenerate the id until it does not collide with a live session
        loop {
            let entry = self
                .cache
                .entry(record.id)
                .or_insert_with(async { record.clone() })
                .await;
            if entry.is_fresh() {
                return Ok(());
            }
            record.id = Id::default();
        }
    }

    async fn save(&self, record: &Record) -> session_store::Result<()> {
        self.cache.insert(record.id, record.clone()).await;
        Ok(())
    }

    async fn load(&self, session_id: &Id) -> session_store::Result<Option<Record>> {
        Ok(self
            .cache
            .get(session_id)
            .await
            .filter(|record| record.expiry_date > OffsetDateTime::now_utc()))
    }

    async fn delete(&self, session_id: &Id) -> session_store::Result<()> {
        self.cache.invalidate(session_id).await;
        Ok(())
    }
}

/// Create the session layer.
///
/// # Arguments
///
/// * `config` - Application configuration (for the cookie `Secure` flag)
#[must_use]
pub fn create_session_layer(config: &AppConfig) -> SessionManagerLayer<VisitorStore> {
    SessionManagerLayer::new(VisitorStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnSessionEnd)
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
