//! HTTP route handlers.
//!
//! Every interaction is a form post that updates the visitor session and
//! redirects (303) back to a page, which is then redrawn from the session.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                          - Registration form or conversation
//! POST /register                  - Submit nickname
//! POST /chat                      - Submit one message
//! GET  /transcript.txt            - Download the transcript
//!
//! # Admin
//! POST /admin/login               - Check the admin token
//! GET  /admin                     - Summary listing (?limit=&nickname=)
//! POST /admin/refresh             - Drop cached listings
//! POST /admin/summaries/{id}/delete - Delete one summary
//! ```

pub mod admin;
pub mod chat;
pub mod transcript;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(admin::index))
        .route("/login", post(admin::login))
        .route("/refresh", post(admin::refresh))
        .route("/summaries/{id}/delete", post(admin::delete))
}

/// Create all visitor-facing routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(chat::index))
        .route("/register", post(chat::register))
        .route("/chat", post(chat::send))
        .route("/transcript.txt", get(transcript::download))
        .nest("/admin", admin_routes())
}
