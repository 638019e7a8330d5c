//! Registration and conversation handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use megami_core::{Notice, TurnRejection, VisitorSession};
use serde::Deserialize;

use crate::config::BookingConfig;
use crate::error::{Result, add_breadcrumb};
use crate::middleware::Visitor;
use crate::services::conversation;
use crate::services::persona;
use crate::services::registration::{self, Gate};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Nickname form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub nickname: String,
}

/// Chat input form data.
#[derive(Debug, Deserialize)]
pub struct ChatForm {
    #[serde(default)]
    pub message: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Registration page template.
#[derive(Template, WebTemplate)]
#[template(path = "register.html")]
pub struct RegisterTemplate {
    pub notices: Vec<Notice>,
}

/// Conversation page template.
#[derive(Template, WebTemplate)]
#[template(path = "chat.html")]
pub struct ChatTemplate {
    pub notices: Vec<Notice>,
    pub messages: Vec<MessageView>,
    pub booking: BookingView,
    pub show_booking_panel: bool,
    pub is_admin: bool,
}

/// One transcript bubble.
#[derive(Debug, Clone)]
pub struct MessageView {
    pub from_user: bool,
    pub content: String,
    /// The one-shot booking announcement; rendered with the booking link.
    pub booking_bubble: bool,
}

/// Booking call-to-action as rendered.
#[derive(Debug, Clone)]
pub struct BookingView {
    /// Empty when no booking URL is configured.
    pub url: String,
    pub embed: bool,
    pub missing_notice: &'static str,
}

impl BookingView {
    fn from_config(config: &BookingConfig) -> Self {
        Self {
            url: config.url.clone().unwrap_or_default(),
            embed: config.embed,
            missing_notice: persona::BOOKING_URL_MISSING,
        }
    }
}

impl ChatTemplate {
    fn build(state: &AppState, visitor: &VisitorSession, notices: Vec<Notice>) -> Self {
        let messages = visitor
            .transcript()
            .iter()
            .map(|m| MessageView {
                from_user: m.is_user(),
                content: m.content.clone(),
                booking_bubble: !m.is_user() && m.content == persona::BOOKING_ANNOUNCEMENT,
            })
            .collect();

        Self {
            notices,
            messages,
            booking: BookingView::from_config(&state.config().booking),
            show_booking_panel: visitor.booking_panel_visible(&state.config().triggers),
            is_admin: visitor.is_admin(),
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Registration form for new visitors, the conversation otherwise.
pub async fn index(State(state): State<AppState>, mut visitor: Visitor) -> Result<Response> {
    let notices = visitor.take_notices();
    if !notices.is_empty() {
        visitor.save().await?;
    }

    match registration::ensure_registered(&mut visitor, None) {
        Gate::Open => Ok(ChatTemplate::build(&state, &visitor, notices).into_response()),
        _ => Ok(RegisterTemplate { notices }.into_response()),
    }
}

/// Submit the nickname form.
pub async fn register(mut visitor: Visitor, Form(form): Form<RegisterForm>) -> Result<Response> {
    match registration::ensure_registered(&mut visitor, Some(&form.nickname)) {
        Gate::Restart => {
            add_breadcrumb("visitor", "Registered");
            visitor.save().await?;
            Ok(Redirect::to("/").into_response())
        }
        Gate::Rejected(notice) => Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            RegisterTemplate {
                notices: vec![notice],
            },
        )
            .into_response()),
        Gate::Open | Gate::Closed => Ok(Redirect::to("/").into_response()),
    }
}

/// Submit one message.
///
/// The reply and every post-turn step complete before the redirect, so the
/// next redraw shows the full outcome of the turn.
pub async fn send(
    State(state): State<AppState>,
    mut visitor: Visitor,
    Form(form): Form<ChatForm>,
) -> Result<Redirect> {
    match conversation::handle_user_turn(&state, &mut visitor, &form.message).await {
        Ok(()) => add_breadcrumb("chat", "User turn"),
        Err(TurnRejection::EmptyInput) => {
            visitor.notify(Notice::warning("メッセージを入力してください。"));
        }
        Err(TurnRejection::NotRegistered) => return Ok(Redirect::to("/")),
    }

    visitor.save().await?;
    Ok(Redirect::to("/"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_booking_view_without_url_is_empty() {
        let view = BookingView::from_config(&BookingConfig::default());
        assert!(view.url.is_empty());
        assert!(!view.embed);
    }

    #[test]
    fn test_booking_view_keeps_url_and_embed() {
        let view = BookingView::from_config(&BookingConfig {
            url: Some("https://example.com/book".to_string()),
            embed: true,
        });
        assert_eq!(view.url, "https://example.com/book");
        assert!(view.embed);
    }

    #[test]
    fn test_register_template_renders_notice() {
        let html = RegisterTemplate {
            notices: vec![Notice::warning("ニックネームを入れてください。")],
        }
        .render()
        .unwrap();
        assert!(html.contains("ニックネームを入れてください。"));
        assert!(html.contains("action=\"/register\""));
    }
}
