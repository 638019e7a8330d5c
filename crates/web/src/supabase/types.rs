//! Summary rows and queries.

use chrono::{DateTime, Utc};
use megami_core::SummaryId;
use serde::{Deserialize, Serialize};

/// A persisted summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub id: SummaryId,
    pub nickname: String,
    pub turns: u32,
    pub summary: String,
    pub transcript: String,
    pub created_at: DateTime<Utc>,
}

/// A summary about to be inserted. `id` and `created_at` are assigned by
/// the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewSummary {
    pub nickname: String,
    pub turns: u32,
    pub summary: String,
    pub transcript: String,
}

/// Parameters of a summary listing. Also the admin page cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SummaryQuery {
    pub limit: usize,
    /// Exact nickname match.
    pub nickname: Option<String>,
}

impl SummaryQuery {
    pub const DEFAULT_LIMIT: usize = 50;
    pub const MAX_LIMIT: usize = 200;

    /// Build a query, clamping `limit` to `1..=MAX_LIMIT` and dropping a
    /// blank nickname filter.
    #[must_use]
    pub fn new(limit: Option<usize>, nickname: Option<&str>) -> Self {
        Self {
            limit: limit
                .unwrap_or(Self::DEFAULT_LIMIT)
                .clamp(1, Self::MAX_LIMIT),
            nickname: nickname
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string),
        }
    }
}

impl Default for SummaryQuery {
    fn default() -> Self {
        Self::new(None, None)
    }
}
