//! Registration gate and the admin side channel.

use megami_core::{NicknameError, Notice, Registration, VisitorSession};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use crate::services::persona;

/// What the caller should do after the gate ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gate {
    /// A nickname is set; render the conversation.
    Open,
    /// The nickname was just set; start a fresh redraw.
    Restart,
    /// The submission was invalid; show the form again with this warning.
    Rejected(Notice),
    /// Nothing submitted and not registered; show only the form.
    Closed,
}

/// Run the registration gate.
///
/// `submission` is the nickname field of this redraw, if the form was
/// submitted.
pub fn ensure_registered(visitor: &mut VisitorSession, submission: Option<&str>) -> Gate {
    if visitor.is_registered() {
        return Gate::Open;
    }
    let Some(raw) = submission else {
        return Gate::Closed;
    };

    match visitor.register(raw, persona::greeting) {
        Ok(Registration::Registered) => {
            tracing::info!("Visitor registered");
            Gate::Restart
        }
        Ok(Registration::AlreadyRegistered) => Gate::Open,
        Err(e) => {
            tracing::debug!(error = %e, "Nickname rejected");
            Gate::Rejected(Notice::warning(match e {
                NicknameError::Empty => "ニックネームを入れてください。",
            }))
        }
    }
}

/// Why an admin login failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AdminAuthError {
    #[error("no admin token is configured")]
    NotConfigured,
    #[error("admin token mismatch")]
    Mismatch,
}

/// Compare `submitted` against the configured admin token and grant admin
/// on a match.
///
/// A single plain equality check, as deployed. No hashing, no constant-time
/// comparison, no rate limiting.
///
/// # Errors
///
/// Returns an error, leaving the session unchanged, when no token is
/// configured or the token does not match.
pub fn authenticate_admin(
    configured: Option<&SecretString>,
    visitor: &mut VisitorSession,
    submitted: &str,
) -> Result<(), AdminAuthError> {
    let expected = configured.ok_or(AdminAuthError::NotConfigured)?;
    if expected.expose_secret() != submitted {
        return Err(AdminAuthError::Mismatch);
    }
    visitor.grant_admin();
    Ok(())
}
