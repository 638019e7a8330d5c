//! Integration test support for Megami.
//!
//! Collaborator doubles that stand in for the chat-completion API, the
//! summary store and the SMTP relay, plus a [`TestClient`] that drives the
//! full router in-process and carries the session cookie between requests.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p megami-integration-tests
//! ```
//!
//! No external services are needed.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{HeaderMap, Request, StatusCode, header};
use chrono::Utc;
use megami_core::{Message, SummaryId};
use megami_web::config::AppConfig;
use megami_web::openai::{ChatCompletion, CompletionError, CompletionOptions};
use megami_web::services::{EmailError, SummaryMail, SummaryMailer};
use megami_web::state::{AppState, Collaborators};
use megami_web::supabase::{NewSummary, StoreError, SummaryQuery, SummaryRecord, SummaryStore};
use tower::ServiceExt;

// =============================================================================
// Chat completion doubles
// =============================================================================

/// Answers every request with the same reply and records the requests.
#[derive(Debug)]
pub struct ScriptedCompletion {
    reply: String,
    requests: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedCompletion {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every message list sent so far.
    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatCompletion for ScriptedCompletion {
    async fn complete(
        &self,
        messages: &[Message],
        _options: CompletionOptions,
    ) -> Result<String, CompletionError> {
        self.requests.lock().unwrap().push(messages.to_vec());
        Ok(self.reply.clone())
    }
}

/// Fails every request as a rate-limited API would.
#[derive(Debug, Default)]
pub struct FailingCompletion;

#[async_trait]
impl ChatCompletion for FailingCompletion {
    async fn complete(
        &self,
        _messages: &[Message],
        _options: CompletionOptions,
    ) -> Result<String, CompletionError> {
        Err(CompletionError::RateLimited(30))
    }
}

// =============================================================================
// Summary store doubles
// =============================================================================

/// In-memory summary table.
#[derive(Debug, Default)]
pub struct MemorySummaryStore {
    rows: Mutex<Vec<SummaryRecord>>,
    next_id: AtomicI64,
    inserts: AtomicUsize,
    lists: AtomicUsize,
}

impl MemorySummaryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-filled with `count` rows for `nickname`.
    pub fn seeded(nickname: &str, count: usize) -> Self {
        let store = Self::new();
        {
            let mut rows = store.rows.lock().unwrap();
            for turn in 1..=count {
                let id = store.next_id.fetch_add(1, Ordering::SeqCst) + 1;
                rows.push(SummaryRecord {
                    id: SummaryId::new(id),
                    nickname: nickname.to_string(),
                    turns: u32::try_from(turn).unwrap(),
                    summary: format!("summary {turn}"),
                    transcript: format!("ユーザー: turn {turn}"),
                    created_at: Utc::now(),
                });
            }
        }
        store
    }

    pub fn rows(&self) -> Vec<SummaryRecord> {
        self.rows.lock().unwrap().clone()
    }

    /// Number of insert calls, failed or not.
    pub fn insert_calls(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    /// Number of list calls that reached the store.
    pub fn list_calls(&self) -> usize {
        self.lists.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SummaryStore for MemorySummaryStore {
    async fn insert(&self, summary: &NewSummary) -> Result<SummaryId, StoreError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        let id = SummaryId::new(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.rows.lock().unwrap().push(SummaryRecord {
            id,
            nickname: summary.nickname.clone(),
            turns: summary.turns,
            summary: summary.summary.clone(),
            transcript: summary.transcript.clone(),
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn list(&self, query: &SummaryQuery) -> Result<Vec<SummaryRecord>, StoreError> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        let mut rows: Vec<_> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| query.nickname.as_ref().is_none_or(|n| &r.nickname == n))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        rows.truncate(query.limit);
        Ok(rows)
    }

    async fn delete(&self, id: SummaryId) -> Result<bool, StoreError> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|r| r.id != id);
        Ok(rows.len() != before)
    }
}

/// A store whose every call fails.
#[derive(Debug, Default)]
pub struct UnreachableStore;

impl UnreachableStore {
    fn error() -> StoreError {
        StoreError::Api {
            status: 503,
            message: "service unavailable".to_string(),
        }
    }
}

#[async_trait]
impl SummaryStore for UnreachableStore {
    async fn insert(&self, _summary: &NewSummary) -> Result<SummaryId, StoreError> {
        Err(Self::error())
    }

    async fn list(&self, _query: &SummaryQuery) -> Result<Vec<SummaryRecord>, StoreError> {
        Err(Self::error())
    }

    async fn delete(&self, _id: SummaryId) -> Result<bool, StoreError> {
        Err(Self::error())
    }
}

// =============================================================================
// Mailer double
// =============================================================================

/// Records summary mails; optionally refuses them.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<SummaryMail>>,
    attempts: AtomicUsize,
    refuse: bool,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mailer whose every send fails.
    pub fn refusing() -> Self {
        Self {
            refuse: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<SummaryMail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SummaryMailer for RecordingMailer {
    async fn send_summary(&self, mail: &SummaryMail) -> Result<(), EmailError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.refuse {
            return Err(EmailError::InvalidAddress("relay refused".to_string()));
        }
        self.sent.lock().unwrap().push(mail.clone());
        Ok(())
    }
}

// =============================================================================
// State and router helpers
// =============================================================================

/// Build a configuration from `vars`, with nothing read from the process
/// environment.
pub fn config(vars: &[(&str, &str)]) -> AppConfig {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    AppConfig::from_vars(&vars).unwrap()
}

/// Application state over `vars` and the given doubles.
pub fn state(vars: &[(&str, &str)], collaborators: Collaborators) -> AppState {
    AppState::new(config(vars), collaborators)
}

/// A response with its body read to a string.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    /// The redirect target, if any.
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }
}

/// Drives the router in-process, keeping the session cookie like a browser
/// tab would.
pub struct TestClient {
    app: Router,
    cookie: Option<String>,
}

impl TestClient {
    pub fn new(state: AppState) -> Self {
        Self {
            app: megami_web::app(state),
            cookie: None,
        }
    }

    pub async fn get(&mut self, path: &str) -> TestResponse {
        let request = self.request("GET", path).body(Body::empty()).unwrap();
        self.send(request).await
    }

    pub async fn post_form(&mut self, path: &str, fields: &[(&str, &str)]) -> TestResponse {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        let request = self
            .request("POST", path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    fn request(&self, method: &str, path: &str) -> axum::http::request::Builder {
        let builder = Request::builder().method(method).uri(path);
        match &self.cookie {
            Some(cookie) => builder.header(header::COOKIE, cookie),
            None => builder,
        }
    }

    async fn send(&mut self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().oneshot(request).await.unwrap();
        if let Some(cookie) = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
        {
            self.cookie = Some(cookie.to_string());
        }

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        TestResponse {
            status,
            headers,
            body: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }
}
