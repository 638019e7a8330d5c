//! Chat-completion collaborator.
//!
//! [`ChatCompletion`] is the seam the conversation and summary services call.
//! [`OpenAiClient`] implements it against any OpenAI-compatible
//! `/chat/completions` endpoint.

mod client;
mod error;
pub mod types;

use async_trait::async_trait;
use megami_core::Message;

pub use client::OpenAiClient;
pub use error::{ApiErrorResponse, CompletionError};

/// Temperature used for persona replies.
pub const PERSONA_TEMPERATURE: f32 = 0.7;

/// Temperature used for summaries.
pub const SUMMARY_TEMPERATURE: f32 = 0.4;

/// Token cap for summaries.
pub const SUMMARY_MAX_TOKENS: u32 = 400;

/// Sampling options for a single completion request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

impl CompletionOptions {
    /// Options for an in-character reply.
    #[must_use]
    pub const fn persona() -> Self {
        Self {
            temperature: PERSONA_TEMPERATURE,
            max_tokens: None,
        }
    }

    /// Options for a conversation summary.
    #[must_use]
    pub const fn summary() -> Self {
        Self {
            temperature: SUMMARY_TEMPERATURE,
            max_tokens: Some(SUMMARY_MAX_TOKENS),
        }
    }
}

/// Something that turns a message list into one reply.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Request a completion for `messages`.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider is unreachable, rejects the request,
    /// or answers without any text.
    async fn complete(
        &self,
        messages: &[Message],
        options: CompletionOptions,
    ) -> Result<String, CompletionError>;
}
