//! OpenAI-compatible chat-completion client.

use std::sync::Arc;

use async_trait::async_trait;
use megami_core::Message;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use tracing::instrument;

use crate::config::OpenAiConfig;

use super::error::{ApiErrorResponse, CompletionError};
use super::types::{ChatMessage, ChatRequest, ChatResponse};
use super::{ChatCompletion, CompletionOptions};

/// Chat-completion client.
///
/// Cheap to clone; the HTTP connection pool is shared.
#[derive(Clone)]
pub struct OpenAiClient {
    inner: Arc<OpenAiClientInner>,
}

struct OpenAiClientInner {
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

impl OpenAiClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key contains invalid header characters or
    /// the HTTP client cannot be built.
    pub fn new(config: &OpenAiConfig) -> Result<Self, CompletionError> {
        let mut bearer =
            HeaderValue::from_str(&format!("Bearer {}", config.api_key.expose_secret()))?;
        bearer.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(AUTHORIZATION, bearer);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            inner: Arc::new(OpenAiClientInner {
                client,
                endpoint: format!("{}/chat/completions", config.base_url),
                model: config.model.clone(),
            }),
        })
    }

    /// Model id sent with every request.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.inner.model
    }

    /// Handle an error status code.
    async fn handle_error_status(
        status: reqwest::StatusCode,
        response: reqwest::Response,
    ) -> CompletionError {
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            return CompletionError::RateLimited(retry_after);
        }

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return CompletionError::Unauthorized("Invalid API key".to_string());
        }

        match response.text().await {
            Ok(body) => match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_error) => CompletionError::Api {
                    error_type: api_error
                        .error
                        .error_type
                        .unwrap_or_else(|| status.as_u16().to_string()),
                    message: api_error.error.message,
                },
                Err(_) => CompletionError::Api {
                    error_type: status.as_u16().to_string(),
                    message: body,
                },
            },
            Err(e) => CompletionError::Http(e),
        }
    }
}

#[async_trait]
impl ChatCompletion for OpenAiClient {
    #[instrument(
        skip(self, messages),
        fields(model = %self.inner.model, messages = messages.len())
    )]
    async fn complete(
        &self,
        messages: &[Message],
        options: CompletionOptions,
    ) -> Result<String, CompletionError> {
        let request = ChatRequest {
            model: &self.inner.model,
            messages: messages
                .iter()
                .map(|m| ChatMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        };

        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::handle_error_status(status, response).await);
        }

        let body = response.text().await?;
        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| CompletionError::Parse(format!("Failed to parse response: {e}")))?;
        parsed.into_text().ok_or(CompletionError::EmptyReply)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn config() -> OpenAiConfig {
        OpenAiConfig {
            api_key: SecretString::from("sk-test"),
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }

    #[test]
    fn test_endpoint_is_derived_from_base_url() {
        let client = OpenAiClient::new(&config()).unwrap();
        assert_eq!(
            client.inner.endpoint,
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(client.model(), "gpt-4o-mini");
    }

    #[test]
    fn test_api_key_with_newline_is_rejected() {
        let mut config = config();
        config.api_key = SecretString::from("sk-\ntest");
        assert!(matches!(
            OpenAiClient::new(&config),
            Err(CompletionError::InvalidApiKey(_))
        ));
    }

    #[test]
    fn test_openai_client_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<OpenAiClient>();
    }
}
