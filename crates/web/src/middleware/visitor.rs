//! Extractors that load the visitor session for a redraw.
//!
//! Each handler receives the session as it was stored after the previous
//! redraw, mutates it, and calls [`Visitor::save`] before responding.

use std::ops::{Deref, DerefMut};

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use megami_core::VisitorSession;
use tower_sessions::Session;

use crate::error::AppError;
use crate::models::session_keys;

/// The current visitor's session state.
///
/// A visitor without stored state starts from an empty, unregistered
/// session.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(mut visitor: Visitor) -> Result<Redirect, AppError> {
///     visitor.grant_admin();
///     visitor.save().await?;
///     Ok(Redirect::to("/"))
/// }
/// ```
pub struct Visitor {
    session: Session,
    state: VisitorSession,
}

impl Visitor {
    /// Persist the (possibly mutated) state for the next redraw.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store rejects the write.
    pub async fn save(&self) -> Result<(), AppError> {
        self.session
            .insert(session_keys::VISITOR, &self.state)
            .await?;
        Ok(())
    }
}

impl Deref for Visitor {
    type Target = VisitorSession;

    fn deref(&self) -> &Self::Target {
        &self.state
    }
}

impl DerefMut for Visitor {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.state
    }
}

impl<S> FromRequestParts<S> for Visitor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by SessionManagerLayer
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Internal("session layer missing".to_string()))?;

        let state = session
            .get::<VisitorSession>(session_keys::VISITOR)
            .await?
            .unwrap_or_default();

        Ok(Self { session, state })
    }
}

/// Extractor that requires an admin visitor.
///
/// Visitors who have not passed the admin token check are sent back to the
/// chat page.
pub struct RequireAdmin(pub Visitor);

/// Error returned when an admin-only route is hit by a non-admin.
pub enum AdminRejection {
    /// Not an admin; redirect to the chat page.
    NotAdmin,
    /// The session could not be loaded.
    Session(AppError),
}

impl IntoResponse for AdminRejection {
    fn into_response(self) -> Response {
        match self {
            Self::NotAdmin => Redirect::to("/").into_response(),
            Self::Session(err) => err.into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AdminRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let visitor = Visitor::from_request_parts(parts, state)
            .await
            .map_err(AdminRejection::Session)?;

        if !visitor.is_admin() {
            tracing::debug!(path = %parts.uri.path(), "Admin route refused");
            return Err(AdminRejection::NotAdmin);
        }

        Ok(Self(visitor))
    }
}
