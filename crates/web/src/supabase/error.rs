//! Error types for the summary store.

use thiserror::Error;

/// Errors that can occur when talking to the summary store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The anon key cannot be sent as a header.
    #[error("invalid API key: {0}")]
    InvalidApiKey(#[from] reqwest::header::InvalidHeaderValue),

    /// The configured URL cannot address the table.
    #[error("invalid store URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The store answered with a non-success status.
    #[error("store returned {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// `PostgREST` error message or raw body.
        message: String,
    },

    /// Failed to parse response.
    #[error("parse error: {0}")]
    Parse(String),
}

/// Error body returned by `PostgREST`.
#[derive(Debug, serde::Deserialize)]
pub struct PostgrestError {
    pub message: String,
    #[serde(default)]
    pub code: Option<String>,
}
