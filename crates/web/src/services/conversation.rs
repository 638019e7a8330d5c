//! The conversation engine: one user turn, end to end.

use chrono::Utc;
use megami_core::{TurnRejection, VisitorSession};
use tracing::instrument;

use crate::openai::CompletionOptions;
use crate::services::{persona, summary};
use crate::state::AppState;

/// Handle one message from the visitor.
///
/// Appends the message, asks the chat-completion collaborator for a reply
/// (or uses the demo reply when none is configured), appends the reply,
/// then runs the post-turn steps. A failed completion is appended as an
/// in-chat error message; it is never returned.
///
/// # Errors
///
/// Returns a rejection, leaving the session untouched, when the visitor
/// has not registered or `input` is blank.
#[instrument(skip_all, fields(turn = visitor.user_turn_count() + 1))]
pub async fn handle_user_turn(
    state: &AppState,
    visitor: &mut VisitorSession,
    input: &str,
) -> Result<(), TurnRejection> {
    visitor.begin_turn(input, Utc::now())?;

    let reply = match state.chat() {
        None => persona::DEMO_REPLY.to_string(),
        Some(chat) => {
            let payload = visitor.completion_payload(state.persona());
            match chat.complete(&payload, CompletionOptions::persona()).await {
                Ok(text) => text.trim().to_string(),
                Err(e) => {
                    tracing::warn!(error = %e, "Chat completion failed");
                    persona::error_reply(&e)
                }
            }
        }
    };
    visitor.finish_turn(reply);

    summary::after_turn(state, visitor).await;
    Ok(())
}
