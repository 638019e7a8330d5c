//! Persona prompt and the fixed lines the bot speaks on its own.

use std::path::Path;

use megami_core::Nickname;

/// System prompt used when no persona file is configured.
pub const DEFAULT_PERSONA: &str = "あなたは『もりえみ』の世界観で話すAIです。やわらかく、断定しすぎず、気づきを促す。医療/法律の断言、恐怖訴求、過度な金銭約束は禁止。各返信は120字前後、絵文字は1つまで、最後に短い質問を1つ。";

/// Reply used when no chat-completion collaborator is configured.
pub const DEMO_REPLY: &str = "（デモ応答）テーマは“自己価値の整え直し”。今週できる小さな一歩を一つだけ挙げてみてください🌙";

/// One-shot booking announcement appended to the transcript.
pub const BOOKING_ANNOUNCEMENT: &str =
    "ここまでお話しありがとう！\n\n▶ ご予約は下のフォーム（またはボタン）からどうぞ。";

/// Shown in place of a booking link when no booking URL is configured.
pub const BOOKING_URL_MISSING: &str =
    "予約URLが未設定です（.env の BOOKING_URL を設定してください）。";

/// Greeting seeded into the transcript at registration.
#[must_use]
pub fn greeting(nickname: &Nickname) -> String {
    format!("{nickname} さん、どんなことでも相談してみて✨もりえみAIが答えるよ✨")
}

/// In-chat message standing in for a failed model reply.
#[must_use]
pub fn error_reply(reason: &impl std::fmt::Display) -> String {
    format!("⚠️ AI応答でエラー：{reason}")
}

/// Load the persona prompt from `path`, falling back to [`DEFAULT_PERSONA`]
/// when no path is given or the file is unreadable or blank.
#[must_use]
pub fn load_persona(path: Option<&Path>) -> String {
    let Some(path) = path else {
        return DEFAULT_PERSONA.to_string();
    };

    match std::fs::read_to_string(path) {
        Ok(text) if !text.trim().is_empty() => {
            tracing::info!(path = %path.display(), "Persona prompt loaded");
            text.trim().to_string()
        }
        Ok(_) => {
            tracing::warn!(path = %path.display(), "Persona file is empty, using default prompt");
            DEFAULT_PERSONA.to_string()
        }
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Persona file unreadable, using default prompt"
            );
            DEFAULT_PERSONA.to_string()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_greeting_mentions_nickname() {
        let nickname = Nickname::parse("Aoi").unwrap();
        assert!(greeting(&nickname).starts_with("Aoi さん"));
    }

    #[test]
    fn test_error_reply_embeds_reason() {
        assert_eq!(error_reply(&"timeout"), "⚠️ AI応答でエラー：timeout");
    }

    #[test]
    fn test_missing_persona_file_falls_back() {
        assert_eq!(load_persona(None), DEFAULT_PERSONA);
        assert_eq!(
            load_persona(Some(Path::new("/nonexistent/persona.txt"))),
            DEFAULT_PERSONA
        );
    }

    #[test]
    fn test_persona_file_is_trimmed() {
        let path = std::env::temp_dir().join(format!("megami-persona-{}.txt", std::process::id()));
        std::fs::write(&path, "\n  やさしく話す  \n").unwrap();
        assert_eq!(load_persona(Some(&path)), "やさしく話す");
        std::fs::remove_file(&path).unwrap();
    }
}
