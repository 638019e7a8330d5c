//! Admin retrieval: cached summary listing and deletion.
//!
//! Listings are cached per query (10 minute TTL) so unrelated redraws of the
//! admin page do not hit the store. Refresh and successful deletes drop the
//! cache. Failed listings are never cached.

use std::sync::Arc;

use megami_core::{Notice, SummaryId};
use tracing::instrument;

use crate::state::AppState;
use crate::supabase::{SummaryQuery, SummaryRecord};

/// One rendered page of summaries.
#[derive(Debug, Clone, Default)]
pub struct SummaryPage {
    pub records: Arc<Vec<SummaryRecord>>,
    /// Set when the store is missing or the query failed; `records` is empty.
    pub warning: Option<Notice>,
}

/// List summaries, newest first.
///
/// Never fails: an unconfigured or unreachable store yields an empty page
/// with a warning.
#[instrument(skip_all, fields(limit = query.limit, nickname = ?query.nickname))]
pub async fn list_summaries(state: &AppState, query: &SummaryQuery) -> SummaryPage {
    let Some(store) = state.store() else {
        return SummaryPage {
            records: Arc::default(),
            warning: Some(Notice::info(
                "要約ストアが未設定です（SUPABASE_URL / SUPABASE_ANON_KEY）。",
            )),
        };
    };

    if let Some(records) = state.summary_cache().get(query).await {
        tracing::debug!("Cache hit for summaries");
        return SummaryPage {
            records,
            warning: None,
        };
    }

    match store.list(query).await {
        Ok(records) => {
            let records = Arc::new(records);
            state
                .summary_cache()
                .insert(query.clone(), Arc::clone(&records))
                .await;
            SummaryPage {
                records,
                warning: None,
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to list summaries");
            SummaryPage {
                records: Arc::default(),
                warning: Some(Notice::warning(format!("要約の取得に失敗しました：{e}"))),
            }
        }
    }
}

/// Delete one summary and report the outcome as a notice.
///
/// Returns whether a row was deleted.
#[instrument(skip_all, fields(id = %id))]
pub async fn delete_summary(state: &AppState, id: SummaryId) -> (bool, Notice) {
    let Some(store) = state.store() else {
        return (false, Notice::warning("要約ストアが未設定です。"));
    };

    match store.delete(id).await {
        Ok(true) => {
            tracing::info!("Summary deleted");
            refresh(state).await;
            (true, Notice::success(format!("要約 #{id} を削除しました。")))
        }
        Ok(false) => (
            false,
            Notice::warning(format!("要約 #{id} は見つかりませんでした。")),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to delete summary");
            (
                false,
                Notice::warning(format!("要約 #{id} の削除に失敗しました：{e}")),
            )
        }
    }
}

/// Drop every cached listing.
pub async fn refresh(state: &AppState) {
    state.summary_cache().invalidate_all();
    state.summary_cache().run_pending_tasks().await;
}
