//! Plain-text views of a transcript, used for summaries, mail and export.

use crate::message::Message;
use crate::policy::{FALLBACK_SUMMARY_LINES, SUMMARY_WINDOW};

/// The trailing part of a transcript that summaries are built from.
#[must_use]
pub fn window(messages: &[Message]) -> &[Message] {
    let start = messages.len().saturating_sub(SUMMARY_WINDOW);
    messages.get(start..).unwrap_or_default()
}

/// A transcript rendered as one `label: content` line per message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptText {
    lines: Vec<String>,
}

impl TranscriptText {
    /// Render every message of `messages`.
    #[must_use]
    pub fn render(messages: &[Message]) -> Self {
        let lines = messages
            .iter()
            .map(|m| format!("{}: {}", m.role.transcript_label(), m.content))
            .collect();
        Self { lines }
    }

    /// Render the summary window of `messages`.
    #[must_use]
    pub fn windowed(messages: &[Message]) -> Self {
        Self::render(window(messages))
    }

    /// Number of rendered messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The full text, newline separated.
    #[must_use]
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Summary used when no chat-completion collaborator is configured:
    /// the first lines of the transcript, verbatim.
    #[must_use]
    pub fn fallback_summary(&self) -> String {
        let head = self
            .lines
            .iter()
            .take(FALLBACK_SUMMARY_LINES)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n");
        format!("【簡易要約（APIキー未設定）】\n{head}\n…（続く）")
    }

    /// Summary stored when the summarization call itself failed.
    #[must_use]
    pub fn failed_summary(&self, reason: &str) -> String {
        format!("（要約失敗: {reason}）\n\n{}", self.text())
    }

    /// Prompt asking the model for key points and next steps.
    #[must_use]
    pub fn summary_prompt(&self) -> String {
        format!(
            "以下は会話ログです。日本語で：\n\
             1) 重要ポイントを箇条書きで5つ以内\n\
             2) 次の一歩を3つ提案\n\
             ---\n\
             {}\n",
            self.text()
        )
    }
}
