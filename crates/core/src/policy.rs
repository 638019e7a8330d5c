//! Turn-count thresholds that drive the booking and mail triggers.

/// How many trailing messages a summary looks at.
pub const SUMMARY_WINDOW: usize = 40;

/// How many transcript lines the offline fallback summary keeps.
pub const FALLBACK_SUMMARY_LINES: usize = 12;

/// Thresholds compared against a session's user-turn counter.
///
/// All values are inclusive: a trigger becomes eligible once
/// `user_turn_count >= threshold`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerPolicy {
    /// Turn at which the one-shot booking announcement is appended.
    pub booking_announce_after: u32,
    /// Turn from which the persistent booking panel is rendered.
    pub booking_panel_after: u32,
    /// Turn at which the legacy summary mail is sent.
    pub summary_mail_after: u32,
}

impl TriggerPolicy {
    pub const DEFAULT_BOOKING_ANNOUNCE_AFTER: u32 = 10;
    pub const DEFAULT_BOOKING_PANEL_AFTER: u32 = 3;
    pub const DEFAULT_SUMMARY_MAIL_AFTER: u32 = 10;
}

impl Default for TriggerPolicy {
    fn default() -> Self {
        Self {
            booking_announce_after: Self::DEFAULT_BOOKING_ANNOUNCE_AFTER,
            booking_panel_after: Self::DEFAULT_BOOKING_PANEL_AFTER,
            summary_mail_after: Self::DEFAULT_SUMMARY_MAIL_AFTER,
        }
    }
}
