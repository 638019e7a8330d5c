//! End-to-end redraw cycles through the HTTP router.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::http::{StatusCode, header};
use megami_integration_tests::{MemorySummaryStore, TestClient, state};
use megami_web::services::persona;
use megami_web::state::Collaborators;

const ADMIN_TOKEN: &str = "kWq3-rT9z-Lm2p-Xv8n";

async fn registered_client(vars: &[(&str, &str)], collaborators: Collaborators) -> TestClient {
    let mut client = TestClient::new(state(vars, collaborators));
    let response = client.post_form("/register", &[("nickname", "Aoi")]).await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    client
}

#[tokio::test]
async fn test_health() {
    let mut client = TestClient::new(state(&[], Collaborators::default()));

    let response = client.get("/health").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, "ok");
    assert!(response.headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn test_fresh_visitor_sees_only_registration_form() {
    let mut client = TestClient::new(state(&[], Collaborators::default()));

    let response = client.get("/").await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("action=\"/register\""));
    assert!(!response.body.contains("action=\"/chat\""));
}

#[tokio::test]
async fn test_blank_nickname_rerenders_form_with_warning() {
    let mut client = TestClient::new(state(&[], Collaborators::default()));

    let response = client.post_form("/register", &[("nickname", "   ")]).await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.body.contains("ニックネームを入れてください。"));
}

#[tokio::test]
async fn test_registration_opens_conversation() {
    let mut client = registered_client(&[], Collaborators::default()).await;

    let page = client.get("/").await;

    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Aoi さん、どんなことでも相談してみて"));
    assert!(page.body.contains("action=\"/chat\""));
    assert!(!page.body.contains("action=\"/register\""));
}

#[tokio::test]
async fn test_chat_turn_redirects_and_shows_reply() {
    let mut client = registered_client(&[], Collaborators::default()).await;

    let response = client
        .post_form("/chat", &[("message", "仕事の流れを整えたい")])
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/"));

    let page = client.get("/").await;
    assert!(page.body.contains("仕事の流れを整えたい"));
    assert!(page.body.contains(persona::DEMO_REPLY));
}

#[tokio::test]
async fn test_empty_chat_input_shows_warning_once() {
    let mut client = registered_client(&[], Collaborators::default()).await;

    client.post_form("/chat", &[("message", "")]).await;

    let page = client.get("/").await;
    assert!(page.body.contains("メッセージを入力してください。"));
    let page = client.get("/").await;
    assert!(!page.body.contains("メッセージを入力してください。"));
}

#[tokio::test]
async fn test_chat_before_registration_returns_to_form() {
    let mut client = TestClient::new(state(&[], Collaborators::default()));

    let response = client.post_form("/chat", &[("message", "hello")]).await;
    assert_eq!(response.location(), Some("/"));

    let page = client.get("/").await;
    assert!(page.body.contains("action=\"/register\""));
}

#[tokio::test]
async fn test_booking_panel_appears_after_three_turns() {
    let mut client = registered_client(&[], Collaborators::default()).await;

    for n in 0..2 {
        let message = format!("message {n}");
        client.post_form("/chat", &[("message", message.as_str())]).await;
    }
    assert!(!client.get("/").await.body.contains("📅 ご予約"));

    client.post_form("/chat", &[("message", "message 2")]).await;
    let page = client.get("/").await;
    assert!(page.body.contains("📅 ご予約"));
    assert!(page.body.contains(persona::BOOKING_URL_MISSING));
}

#[tokio::test]
async fn test_booking_announcement_links_booking_url() {
    let mut client = registered_client(
        &[
            ("BOOKING_URL", "https://example.com/book"),
            ("BOOKING_ANNOUNCE_AFTER", "1"),
        ],
        Collaborators::default(),
    )
    .await;

    client.post_form("/chat", &[("message", "hello")]).await;

    let page = client.get("/").await;
    assert!(page.body.contains("ご予約はこちらから"));
    assert!(page.body.contains("href=\"https://example.com/book\""));
    assert!(page.body.contains("📅 予約フォームを開く"));
}

#[tokio::test]
async fn test_transcript_download() {
    let mut client = registered_client(&[], Collaborators::default()).await;
    client.post_form("/chat", &[("message", "hello")]).await;

    let response = client.get("/transcript.txt").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.headers.get(header::CONTENT_TYPE).unwrap(),
        "text/plain; charset=utf-8"
    );
    assert!(
        response
            .headers
            .get(header::CONTENT_DISPOSITION)
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("attachment")
    );
    assert!(response.body.starts_with("Bot: Aoi さん"));
    assert!(response.body.contains("ユーザー: hello"));
}

#[tokio::test]
async fn test_transcript_requires_registration() {
    let mut client = TestClient::new(state(&[], Collaborators::default()));

    let response = client.get("/transcript.txt").await;

    assert_eq!(response.location(), Some("/"));
}

// ============================================================================
// Admin
// ============================================================================

#[tokio::test]
async fn test_admin_token_mismatch_reports_and_denies() {
    let mut client =
        registered_client(&[("ADMIN_TOKEN", ADMIN_TOKEN)], Collaborators::default()).await;

    let response = client.post_form("/admin/login", &[("token", "guess")]).await;
    assert_eq!(response.location(), Some("/"));

    let page = client.get("/").await;
    assert!(page.body.contains("管理トークンが違います。"));
    assert!(!page.body.contains("href=\"/admin\""));

    let response = client.get("/admin").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/"));
}

#[tokio::test]
async fn test_admin_login_without_configured_token_fails() {
    let mut client = registered_client(&[], Collaborators::default()).await;

    client.post_form("/admin/login", &[("token", "")]).await;

    assert_eq!(client.get("/admin").await.location(), Some("/"));
}

#[tokio::test]
async fn test_admin_lists_and_deletes_summaries() {
    let store = Arc::new(MemorySummaryStore::seeded("Aoi", 2));
    let collaborators = Collaborators {
        store: Some(store.clone()),
        ..Collaborators::default()
    };
    let mut client = registered_client(&[("ADMIN_TOKEN", ADMIN_TOKEN)], collaborators).await;

    let response = client
        .post_form("/admin/login", &[("token", ADMIN_TOKEN)])
        .await;
    assert_eq!(response.location(), Some("/admin"));

    let page = client.get("/admin").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("管理者としてログインしました。"));
    assert!(page.body.contains("summary 1"));
    assert!(page.body.contains("summary 2"));

    let response = client
        .post_form("/admin/summaries/1/delete", &[("limit", "20"), ("nickname", "Aoi")])
        .await;
    assert_eq!(response.location(), Some("/admin?limit=20&nickname=Aoi"));

    let page = client.get("/admin?limit=20&nickname=Aoi").await;
    assert!(page.body.contains("要約 #1 を削除しました。"));
    assert!(!page.body.contains("summary 1"));
    assert!(page.body.contains("summary 2"));
    assert_eq!(store.rows().len(), 1);
}

#[tokio::test]
async fn test_admin_refresh_refetches() {
    let store = Arc::new(MemorySummaryStore::seeded("Aoi", 1));
    let collaborators = Collaborators {
        store: Some(store.clone()),
        ..Collaborators::default()
    };
    let mut client = registered_client(&[("ADMIN_TOKEN", ADMIN_TOKEN)], collaborators).await;
    client
        .post_form("/admin/login", &[("token", ADMIN_TOKEN)])
        .await;

    client.get("/admin").await;
    client.get("/admin").await;
    assert_eq!(store.list_calls(), 1);

    let response = client.post_form("/admin/refresh", &[]).await;
    assert_eq!(response.location(), Some("/admin?limit=50"));

    client.get("/admin?limit=50").await;
    assert_eq!(store.list_calls(), 2);
}

#[tokio::test]
async fn test_admin_without_store_shows_notice() {
    let mut client =
        registered_client(&[("ADMIN_TOKEN", ADMIN_TOKEN)], Collaborators::default()).await;
    client
        .post_form("/admin/login", &[("token", ADMIN_TOKEN)])
        .await;

    let page = client.get("/admin").await;

    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("SUPABASE_URL"));
    assert!(page.body.contains("要約はまだありません。"));
}
