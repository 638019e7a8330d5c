//! Transcript download.

use axum::{
    http::header,
    response::{IntoResponse, Redirect, Response},
};
use megami_core::TranscriptText;

use crate::middleware::Visitor;

/// Download the full transcript as plain text.
///
/// Unregistered visitors are sent to the registration form.
pub async fn download(visitor: Visitor) -> Response {
    if !visitor.is_registered() {
        return Redirect::to("/").into_response();
    }

    let text = TranscriptText::render(visitor.transcript()).text();
    (
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"transcript.txt\"",
            ),
        ],
        text,
    )
        .into_response()
}
