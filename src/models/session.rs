//! Session lifecycle states and the transition table.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a play session.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Waiting for the first interaction.
    #[default]
    Idle,
    /// Gameplay running.
    Active,
    /// Session ended in failure. Terminal.
    Failed,
    /// Session completed the level. Terminal.
    Finished,
}

impl SessionState {
    /// Whether no further transition can leave this state.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Failed | Self::Finished)
    }

    /// Determine whether a lifecycle transition is permitted.
    ///
    /// `Idle -> Failed` is allowed so a player can lose before the first
    /// interaction registers.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Active | Self::Failed) | (Self::Active, Self::Failed | Self::Finished)
        )
    }

    /// Whether score may still accumulate in this state.
    #[must_use]
    pub fn accepts_score(self) -> bool {
        self != Self::Failed
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::Active => "active",
            Self::Failed => "failed",
            Self::Finished => "finished",
        };
        f.write_str(label)
    }
}
