//! Admin handlers: token login and the summary listing.

use std::sync::Arc;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use megami_core::{Notice, SummaryId};
use serde::Deserialize;

use crate::error::{Result, add_breadcrumb};
use crate::middleware::{RequireAdmin, Visitor};
use crate::services::admin;
use crate::services::registration::{self, AdminAuthError};
use crate::state::AppState;
use crate::supabase::{SummaryQuery, SummaryRecord};

/// Admin token form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub token: String,
}

/// Listing filter, from the query string or the hidden fields of a form.
///
/// `limit` is kept as text so an empty number input does not reject the
/// request.
#[derive(Debug, Default, Deserialize)]
pub struct ListingFilter {
    pub limit: Option<String>,
    pub nickname: Option<String>,
}

impl ListingFilter {
    fn query(&self) -> SummaryQuery {
        let limit = self
            .limit
            .as_deref()
            .and_then(|l| l.trim().parse::<usize>().ok());
        SummaryQuery::new(limit, self.nickname.as_deref())
    }

    /// The admin page URL with this filter applied.
    fn location(&self) -> String {
        let query = self.query();
        let mut location = format!("/admin?limit={}", query.limit);
        if let Some(nickname) = &query.nickname {
            location.push_str("&nickname=");
            location.push_str(&urlencoding::encode(nickname));
        }
        location
    }
}

/// Summary listing template.
#[derive(Template, WebTemplate)]
#[template(path = "admin.html")]
pub struct AdminTemplate {
    pub notices: Vec<Notice>,
    pub records: Arc<Vec<SummaryRecord>>,
    pub nickname: String,
    pub limit: usize,
}

/// Check the submitted admin token.
pub async fn login(
    State(state): State<AppState>,
    mut visitor: Visitor,
    Form(form): Form<LoginForm>,
) -> Result<Redirect> {
    let outcome = registration::authenticate_admin(
        state.config().admin_token.as_ref(),
        &mut visitor,
        &form.token,
    );

    let target = match outcome {
        Ok(()) => {
            tracing::info!("Admin login");
            add_breadcrumb("admin", "Logged in");
            visitor.notify(Notice::success("管理者としてログインしました。"));
            "/admin"
        }
        Err(AdminAuthError::NotConfigured) => {
            visitor.notify(Notice::error(
                "ADMIN_TOKEN が未設定のため管理者ログインできません。",
            ));
            "/"
        }
        Err(AdminAuthError::Mismatch) => {
            tracing::warn!("Admin token mismatch");
            visitor.notify(Notice::error("管理トークンが違います。"));
            "/"
        }
    };

    visitor.save().await?;
    Ok(Redirect::to(target))
}

/// Summary listing, newest first.
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(mut visitor): RequireAdmin,
    Query(filter): Query<ListingFilter>,
) -> Result<Response> {
    let query = filter.query();
    let page = admin::list_summaries(&state, &query).await;

    let mut notices = visitor.take_notices();
    if !notices.is_empty() {
        visitor.save().await?;
    }
    notices.extend(page.warning);

    Ok(AdminTemplate {
        notices,
        records: page.records,
        nickname: query.nickname.unwrap_or_default(),
        limit: query.limit,
    }
    .into_response())
}

/// Drop every cached listing and redraw.
pub async fn refresh(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Form(filter): Form<ListingFilter>,
) -> Redirect {
    admin::refresh(&state).await;
    Redirect::to(&filter.location())
}

/// Delete one summary and return to the listing.
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(mut visitor): RequireAdmin,
    Path(id): Path<SummaryId>,
    Form(filter): Form<ListingFilter>,
) -> Result<Redirect> {
    let (_, notice) = admin::delete_summary(&state, id).await;
    visitor.notify(notice);
    visitor.save().await?;
    Ok(Redirect::to(&filter.location()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_location_encodes_nickname() {
        let filter = ListingFilter {
            limit: Some("20".to_string()),
            nickname: Some("あおい".to_string()),
        };
        assert_eq!(
            filter.location(),
            "/admin?limit=20&nickname=%E3%81%82%E3%81%8A%E3%81%84"
        );
    }

    #[test]
    fn test_filter_tolerates_empty_limit() {
        let filter = ListingFilter {
            limit: Some(String::new()),
            nickname: Some("  ".to_string()),
        };
        assert_eq!(filter.query(), SummaryQuery::default());
        assert_eq!(
            filter.location(),
            format!("/admin?limit={}", SummaryQuery::DEFAULT_LIMIT)
        );
    }
}
