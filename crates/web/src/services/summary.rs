//! Work done after every completed user turn.
//!
//! Runs inline, in this order:
//! 1. summarize the windowed transcript and persist it (store configured)
//! 2. append the one-shot booking announcement (threshold reached)
//! 3. send the legacy summary mail (threshold reached, mailer configured)
//!
//! None of these can fail the turn. Store and mail failures become notices
//! on the visitor's session; a failed summary request is stored as a
//! fallback text.

use megami_core::{Message, Notice, TranscriptText, VisitorSession};
use tracing::instrument;

use crate::openai::{ChatCompletion, CompletionOptions};
use crate::services::email::SummaryMail;
use crate::services::persona;
use crate::state::AppState;
use crate::supabase::NewSummary;

/// Summarize `text`.
///
/// Without a chat-completion collaborator this is the verbatim head of the
/// transcript. A failed request yields the transcript prefixed with the
/// failure reason.
pub async fn summarize(chat: Option<&dyn ChatCompletion>, text: &TranscriptText) -> String {
    let Some(chat) = chat else {
        return text.fallback_summary();
    };

    let prompt = [Message::user(text.summary_prompt())];
    match chat.complete(&prompt, CompletionOptions::summary()).await {
        Ok(summary) => summary.trim().to_string(),
        Err(e) => {
            tracing::warn!(error = %e, "Summary request failed");
            text.failed_summary(&e.to_string())
        }
    }
}

/// Run the post-turn steps for `visitor`.
#[instrument(skip_all, fields(turns = visitor.user_turn_count()))]
pub async fn after_turn(state: &AppState, visitor: &mut VisitorSession) {
    let policy = state.config().triggers;
    let text = TranscriptText::windowed(visitor.transcript());

    let summary = summarize_and_store(state, visitor, &text).await;

    if visitor.announce_booking(&policy, persona::BOOKING_ANNOUNCEMENT) {
        tracing::info!("Booking announcement appended");
    }

    maybe_send_summary_mail(state, visitor, &text, summary).await;
}

/// Summarize and persist one record. Returns the summary, or `None` when
/// no store is configured and nothing was summarized.
pub async fn summarize_and_store(
    state: &AppState,
    visitor: &mut VisitorSession,
    text: &TranscriptText,
) -> Option<String> {
    let store = state.store()?;
    let nickname = visitor.nickname()?.to_string();

    let summary = summarize(state.chat(), text).await;
    let row = NewSummary {
        nickname,
        turns: visitor.user_turn_count(),
        summary: summary.clone(),
        transcript: text.text(),
    };

    match store.insert(&row).await {
        Ok(id) => tracing::info!(id = %id, "Summary stored"),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to store summary");
            visitor.notify(Notice::warning(format!("要約の保存に失敗しました：{e}")));
        }
    }

    Some(summary)
}

/// Send the summary mail once the mail threshold is reached.
///
/// Reuses `summary` when the store step already produced one. The
/// `mail_sent` latch fires only after a successful send, so a failed send
/// is retried on the next turn.
pub async fn maybe_send_summary_mail(
    state: &AppState,
    visitor: &mut VisitorSession,
    text: &TranscriptText,
    summary: Option<String>,
) {
    if !visitor.summary_mail_due(&state.config().triggers) {
        return;
    }
    let Some(mailer) = state.mailer() else {
        return;
    };
    let Some(nickname) = visitor.nickname() else {
        return;
    };

    let summary = match summary {
        Some(summary) => summary,
        None => summarize(state.chat(), text).await,
    };
    let mail = SummaryMail {
        nickname: nickname.to_string(),
        summary,
        transcript: text.text(),
        booking_url: state.config().booking.url.clone(),
    };

    match mailer.send_summary(&mail).await {
        Ok(()) => {
            visitor.mark_mail_sent();
            visitor.notify(Notice::success("✅ 要約をメールで送信しました！"));
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to send summary mail");
            visitor.notify(Notice::error(format!("メール送信に失敗：{e}")));
        }
    }
}
