//! One-shot latches.

use serde::{Deserialize, Serialize};

/// A flag with the single irreversible transition `Unfired -> Fired`.
///
/// A latch cannot be reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Latch {
    #[default]
    Unfired,
    Fired,
}

impl Latch {
    /// Fire the latch.
    ///
    /// Returns `true` only for the call that performed the transition.
    pub const fn fire(&mut self) -> bool {
        match self {
            Self::Unfired => {
                *self = Self::Fired;
                true
            }
            Self::Fired => false,
        }
    }

    /// Whether the latch has fired.
    #[must_use]
    pub const fn is_fired(self) -> bool {
        matches!(self, Self::Fired)
    }
}
