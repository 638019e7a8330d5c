//! Small enums shared between the session and the HTTP layer.

use serde::{Deserialize, Serialize};

/// Who authored a message.
///
/// `System` only ever appears in the payload sent to the chat-completion
/// collaborator; a visitor transcript holds `User` and `Assistant` messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl ChatRole {
    /// Wire name used by chat-completion APIs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    /// Speaker label used in plain-text transcripts.
    #[must_use]
    pub const fn transcript_label(self) -> &'static str {
        match self {
            Self::User => "ユーザー",
            Self::Assistant | Self::System => "Bot",
        }
    }
}

impl std::fmt::Display for ChatRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of a notice surfaced to the visitor on the next render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

impl NoticeLevel {
    /// CSS class suffix for the notice banner.
    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_role_wire_names() {
        assert_eq!(serde_json::to_string(&ChatRole::Assistant).unwrap(), "\"assistant\"");
        assert_eq!(ChatRole::System.to_string(), "system");
    }

    #[test]
    fn test_transcript_labels() {
        assert_eq!(ChatRole::User.transcript_label(), "ユーザー");
        assert_eq!(ChatRole::Assistant.transcript_label(), "Bot");
    }
}
