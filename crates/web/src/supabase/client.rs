//! Supabase `PostgREST` client for the summaries table.

use std::sync::Arc;

use async_trait::async_trait;
use megami_core::SummaryId;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use tracing::instrument;
use url::Url;

use crate::config::SupabaseConfig;

use super::error::{PostgrestError, StoreError};
use super::types::{NewSummary, SummaryQuery, SummaryRecord};
use super::SummaryStore;

/// Summary store backed by a Supabase table.
#[derive(Clone)]
pub struct SupabaseStore {
    inner: Arc<SupabaseStoreInner>,
}

struct SupabaseStoreInner {
    client: reqwest::Client,
    table_url: Url,
}

impl SupabaseStore {
    /// Create a new store client.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid, the key contains invalid
    /// header characters, or the HTTP client cannot be built.
    pub fn new(config: &SupabaseConfig) -> Result<Self, StoreError> {
        let key = config.anon_key.expose_secret();

        let mut apikey = HeaderValue::from_str(key)?;
        apikey.set_sensitive(true);
        let mut bearer = HeaderValue::from_str(&format!("Bearer {key}"))?;
        bearer.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("apikey", apikey);
        headers.insert(AUTHORIZATION, bearer);
        // Mutations echo the affected rows back
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        let table_url = Url::parse(&format!("{}/rest/v1/{}", config.url, config.table))?;

        Ok(Self {
            inner: Arc::new(SupabaseStoreInner { client, table_url }),
        })
    }

    /// URL for a listing.
    fn list_url(&self, query: &SummaryQuery) -> Url {
        let mut url = self.inner.table_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("select", "*")
                .append_pair("order", "created_at.desc")
                .append_pair("limit", &query.limit.to_string());
            if let Some(nickname) = &query.nickname {
                pairs.append_pair("nickname", &format!("eq.{nickname}"));
            }
        }
        url
    }

    /// URL addressing one row by id.
    fn row_url(&self, id: SummaryId) -> Url {
        let mut url = self.inner.table_url.clone();
        url.query_pairs_mut()
            .append_pair("id", &format!("eq.{id}"));
        url
    }

    /// Decode a success body, or turn an error status into `StoreError::Api`.
    async fn read_rows<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<Vec<T>, StoreError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<PostgrestError>(&body)
                .map_or(body, |err| err.message);
            return Err(StoreError::Api {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body)
            .map_err(|e| StoreError::Parse(format!("Failed to parse rows: {e}")))
    }
}

#[async_trait]
impl SummaryStore for SupabaseStore {
    #[instrument(skip(self, summary), fields(nickname = %summary.nickname, turns = summary.turns))]
    async fn insert(&self, summary: &NewSummary) -> Result<SummaryId, StoreError> {
        let response = self
            .inner
            .client
            .post(self.inner.table_url.clone())
            .json(summary)
            .send()
            .await?;

        let rows: Vec<SummaryRecord> = Self::read_rows(response).await?;
        rows.into_iter()
            .next()
            .map(|row| row.id)
            .ok_or_else(|| StoreError::Parse("insert returned no rows".to_string()))
    }

    #[instrument(skip(self), fields(limit = query.limit, nickname = ?query.nickname))]
    async fn list(&self, query: &SummaryQuery) -> Result<Vec<SummaryRecord>, StoreError> {
        let response = self
            .inner
            .client
            .get(self.list_url(query))
            .send()
            .await?;

        Self::read_rows(response).await
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn delete(&self, id: SummaryId) -> Result<bool, StoreError> {
        let response = self
            .inner
            .client
            .delete(self.row_url(id))
            .send()
            .await?;

        let rows: Vec<serde_json::Value> = Self::read_rows(response).await?;
        Ok(!rows.is_empty())
    }
}
