//! Summary row-store collaborator.
//!
//! [`SummaryStore`] is the seam used by the summary and admin services.
//! [`SupabaseStore`] implements it over Supabase's `PostgREST` API against a
//! table shaped like:
//!
//! ```sql
//! CREATE TABLE summaries (
//!     id BIGSERIAL PRIMARY KEY,
//!     nickname TEXT NOT NULL,
//!     turns INTEGER NOT NULL,
//!     summary TEXT NOT NULL,
//!     transcript TEXT NOT NULL,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//!
//! CREATE INDEX idx_summaries_nickname ON summaries(nickname);
//! ```

mod client;
mod error;
mod types;

use async_trait::async_trait;
use megami_core::SummaryId;

pub use client::SupabaseStore;
pub use error::StoreError;
pub use types::{NewSummary, SummaryQuery, SummaryRecord};

/// Persistent storage for conversation summaries.
#[async_trait]
pub trait SummaryStore: Send + Sync {
    /// Insert a summary and return the id the store assigned.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreachable or rejects the row.
    async fn insert(&self, summary: &NewSummary) -> Result<SummaryId, StoreError>;

    /// Newest summaries first, capped at `query.limit`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreachable or the response is
    /// malformed.
    async fn list(&self, query: &SummaryQuery) -> Result<Vec<SummaryRecord>, StoreError>;

    /// Delete a summary. Returns `false` when no row had that id.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreachable or rejects the request.
    async fn delete(&self, id: SummaryId) -> Result<bool, StoreError>;
}
