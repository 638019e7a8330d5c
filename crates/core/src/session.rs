//! Per-visitor session state and its lifecycle transitions.
//!
//! A [`VisitorSession`] is created on the first request of a browser tab and
//! lives until that tab's session cookie goes away. Every request (a
//! "redraw") loads it, applies at most one transition, and stores it back.
//!
//! ```text
//!  unregistered ──register──▶ registered ──turn──▶ registered (count + 1)
//!                                               │
//!                         count ≥ announce ─────┤ booking_shown: Unfired → Fired
//!                         count ≥ mail     ─────┘ mail_sent:     Unfired → Fired
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::message::{Message, Notice};
use crate::policy::TriggerPolicy;
use crate::transcript;
use crate::types::{Latch, Nickname, NicknameError};

/// Result of a registration attempt that did not fail validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// The nickname was set and the greeting seeded.
    Registered,
    /// The session already had a nickname; nothing changed.
    AlreadyRegistered,
}

/// Why a user turn was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TurnRejection {
    #[error("visitor has not registered a nickname")]
    NotRegistered,
    #[error("message is empty")]
    EmptyInput,
}

/// All state kept for one visitor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitorSession {
    nickname: Option<Nickname>,
    is_admin: bool,
    transcript: Vec<Message>,
    user_turn_count: u32,
    mail_sent: Latch,
    booking_shown: Latch,
    last_activity: Option<DateTime<Utc>>,
    #[serde(default)]
    notices: Vec<Notice>,
}

impl VisitorSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn nickname(&self) -> Option<&Nickname> {
        self.nickname.as_ref()
    }

    #[must_use]
    pub const fn is_registered(&self) -> bool {
        self.nickname.is_some()
    }

    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.is_admin
    }

    #[must_use]
    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    #[must_use]
    pub const fn user_turn_count(&self) -> u32 {
        self.user_turn_count
    }

    #[must_use]
    pub const fn mail_sent(&self) -> Latch {
        self.mail_sent
    }

    #[must_use]
    pub const fn booking_shown(&self) -> Latch {
        self.booking_shown
    }

    #[must_use]
    pub const fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.last_activity
    }

    /// Set the nickname and seed the transcript with a greeting.
    ///
    /// A session that already has a nickname is left untouched, whatever the
    /// input.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is not a valid [`Nickname`]; the
    /// session is unchanged in that case.
    pub fn register(
        &mut self,
        raw: &str,
        greeting: impl FnOnce(&Nickname) -> String,
    ) -> Result<Registration, NicknameError> {
        if self.nickname.is_some() {
            return Ok(Registration::AlreadyRegistered);
        }

        let nickname = Nickname::parse(raw)?;
        self.transcript = vec![Message::assistant(greeting(&nickname))];
        self.mail_sent = Latch::Unfired;
        self.nickname = Some(nickname);
        Ok(Registration::Registered)
    }

    /// Mark the visitor as an administrator for the rest of the session.
    pub const fn grant_admin(&mut self) {
        self.is_admin = true;
    }

    /// Append the visitor's message and bump the turn counter.
    ///
    /// # Errors
    ///
    /// Rejects the turn, without touching the session, when the visitor is not
    /// registered or `input` is blank.
    pub fn begin_turn(&mut self, input: &str, now: DateTime<Utc>) -> Result<(), TurnRejection> {
        if self.nickname.is_none() {
            return Err(TurnRejection::NotRegistered);
        }
        if input.trim().is_empty() {
            return Err(TurnRejection::EmptyInput);
        }

        self.transcript.push(Message::user(input));
        self.user_turn_count += 1;
        self.last_activity = Some(now);
        Ok(())
    }

    /// The messages sent to the chat-completion collaborator: the persona
    /// prompt followed by the whole transcript.
    #[must_use]
    pub fn completion_payload(&self, system_prompt: &str) -> Vec<Message> {
        std::iter::once(Message::system(system_prompt))
            .chain(self.transcript.iter().cloned())
            .collect()
    }

    /// Append the assistant's side of the current turn.
    pub fn finish_turn(&mut self, reply: impl Into<String>) {
        self.transcript.push(Message::assistant(reply));
    }

    /// The trailing messages a summary is built from.
    #[must_use]
    pub fn summary_window(&self) -> &[Message] {
        transcript::window(&self.transcript)
    }

    /// Append the booking announcement the first time the announce threshold
    /// is reached.
    ///
    /// Returns `true` only on the call that appended it.
    pub fn announce_booking(&mut self, policy: &TriggerPolicy, announcement: &str) -> bool {
        if self.user_turn_count < policy.booking_announce_after {
            return false;
        }
        if !self.booking_shown.fire() {
            return false;
        }
        self.transcript.push(Message::assistant(announcement));
        true
    }

    /// Whether the persistent booking panel belongs on this render.
    ///
    /// Pure display logic: it changes no state and is safe to call on every
    /// redraw.
    #[must_use]
    pub const fn booking_panel_visible(&self, policy: &TriggerPolicy) -> bool {
        self.nickname.is_some() && self.user_turn_count >= policy.booking_panel_after
    }

    /// Whether the legacy summary mail should be attempted now.
    #[must_use]
    pub const fn summary_mail_due(&self, policy: &TriggerPolicy) -> bool {
        self.user_turn_count >= policy.summary_mail_after && !self.mail_sent.is_fired()
    }

    /// Record that the summary mail went out. Returns `true` the first time.
    pub const fn mark_mail_sent(&mut self) -> bool {
        self.mail_sent.fire()
    }

    /// Queue a notice for the next render.
    pub fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    #[must_use]
    pub fn pending_notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Drain queued notices.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::ChatRole;

    const ANNOUNCEMENT: &str = "booking is open";

    fn greet(nickname: &Nickname) -> String {
        format!("{nickname} さん、ようこそ")
    }

    fn registered(name: &str) -> VisitorSession {
        let mut session = VisitorSession::new();
        session.register(name, greet).unwrap();
        session
    }

    fn play_turn(session: &mut VisitorSession, policy: &TriggerPolicy, input: &str) {
        session.begin_turn(input, Utc::now()).unwrap();
        session.finish_turn("reply");
        session.announce_booking(policy, ANNOUNCEMENT);
    }

    fn announcements(session: &VisitorSession) -> usize {
        session
            .transcript()
            .iter()
            .filter(|m| m.content == ANNOUNCEMENT)
            .count()
    }

    #[test]
    fn test_fresh_registration_seeds_single_greeting() {
        let session = registered("Aoi");

        assert_eq!(session.nickname().unwrap().as_str(), "Aoi");
        assert_eq!(session.transcript().len(), 1);
        let greeting = session.transcript().first().unwrap();
        assert_eq!(greeting.role, ChatRole::Assistant);
        assert!(greeting.content.contains("Aoi"));
        assert_eq!(session.user_turn_count(), 0);
        assert!(!session.mail_sent().is_fired());
    }

    #[test]
    fn test_register_trims_and_sets_once() {
        let mut session = VisitorSession::new();
        assert_eq!(
            session.register("  Aoi  ", greet).unwrap(),
            Registration::Registered
        );
        assert_eq!(
            session.register("Ren", greet).unwrap(),
            Registration::AlreadyRegistered
        );
        assert_eq!(session.nickname().unwrap().as_str(), "Aoi");
        assert_eq!(session.transcript().len(), 1);
    }

    #[test]
    fn test_register_blank_leaves_session_untouched() {
        let mut session = VisitorSession::new();
        assert!(session.register("   ", greet).is_err());
        assert_eq!(session, VisitorSession::new());
    }

    #[test]
    fn test_turn_requires_registration_and_input() {
        let mut session = VisitorSession::new();
        assert_eq!(
            session.begin_turn("hello", Utc::now()),
            Err(TurnRejection::NotRegistered)
        );

        let mut session = registered("Aoi");
        assert_eq!(
            session.begin_turn(" \n ", Utc::now()),
            Err(TurnRejection::EmptyInput)
        );
        assert_eq!(session.user_turn_count(), 0);
        assert!(session.last_activity().is_none());
    }

    #[test]
    fn test_transcript_length_is_one_plus_two_per_turn() {
        let policy = TriggerPolicy::default();
        let mut session = registered("Aoi");
        for n in 1..=9 {
            play_turn(&mut session, &policy, "question");
            assert_eq!(session.transcript().len(), 1 + 2 * n);
        }
    }

    #[test]
    fn test_nine_turns_do_not_announce_booking() {
        let policy = TriggerPolicy::default();
        let mut session = registered("Aoi");
        for _ in 0..9 {
            play_turn(&mut session, &policy, "question");
        }
        assert_eq!(announcements(&session), 0);
        assert!(!session.booking_shown().is_fired());
    }

    #[test]
    fn test_tenth_turn_announces_booking_exactly_once() {
        let policy = TriggerPolicy::default();
        let mut session = registered("Aoi");
        for _ in 0..10 {
            play_turn(&mut session, &policy, "question");
        }
        assert_eq!(announcements(&session), 1);
        assert!(session.booking_shown().is_fired());
        assert_eq!(session.transcript().len(), 1 + 2 * 10 + 1);
        assert_eq!(session.transcript().last().unwrap().content, ANNOUNCEMENT);

        play_turn(&mut session, &policy, "question");
        for _ in 0..5 {
            assert!(!session.announce_booking(&policy, ANNOUNCEMENT));
        }
        assert_eq!(announcements(&session), 1);
    }

    #[test]
    fn test_booking_panel_threshold_is_independent_of_announcement() {
        let policy = TriggerPolicy::default();
        let mut session = registered("Aoi");
        for _ in 0..2 {
            play_turn(&mut session, &policy, "question");
        }
        assert!(!session.booking_panel_visible(&policy));

        play_turn(&mut session, &policy, "question");
        assert!(session.booking_panel_visible(&policy));
        assert!(!session.booking_shown().is_fired());
        // Rendering the panel twice leaves the transcript alone.
        let before = session.transcript().len();
        assert!(session.booking_panel_visible(&policy));
        assert_eq!(session.transcript().len(), before);
    }

    #[test]
    fn test_completion_payload_starts_with_system_prompt() {
        let mut session = registered("Aoi");
        session.begin_turn("hi", Utc::now()).unwrap();

        let payload = session.completion_payload("persona");
        assert_eq!(payload.len(), 3);
        assert_eq!(payload.first().unwrap(), &Message::system("persona"));
        assert_eq!(payload.last().unwrap(), &Message::user("hi"));
    }

    #[test]
    fn test_summary_mail_due_until_marked() {
        let policy = TriggerPolicy {
            summary_mail_after: 2,
            ..TriggerPolicy::default()
        };
        let mut session = registered("Aoi");
        play_turn(&mut session, &policy, "one");
        assert!(!session.summary_mail_due(&policy));

        play_turn(&mut session, &policy, "two");
        assert!(session.summary_mail_due(&policy));
        assert!(session.mark_mail_sent());
        assert!(!session.summary_mail_due(&policy));
        assert!(!session.mark_mail_sent());
    }

    #[test]
    fn test_admin_grant_is_sticky() {
        let mut session = VisitorSession::new();
        assert!(!session.is_admin());
        session.grant_admin();
        assert!(session.is_admin());
    }

    #[test]
    fn test_notices_drain() {
        let mut session = VisitorSession::new();
        session.notify(Notice::warning("store down"));
        assert_eq!(session.pending_notices().len(), 1);
        assert_eq!(session.take_notices(), vec![Notice::warning("store down")]);
        assert!(session.pending_notices().is_empty());
    }

    #[test]
    fn test_session_survives_serde_roundtrip() {
        let policy = TriggerPolicy::default();
        let mut session = registered("Aoi");
        play_turn(&mut session, &policy, "question");

        let json = serde_json::to_string(&session).unwrap();
        let restored: VisitorSession = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, session);
    }
}
