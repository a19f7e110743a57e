//! Persisted cross-session progress.

use serde::{Deserialize, Serialize};

/// The single durable record: the last level the player finished.
///
/// Serialized as `{ "lastFinishedLevel": n }`. Unknown fields are ignored and
/// a missing field decodes as `0`, so records written by other versions stay
/// loadable.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    /// Index of the last level completed.
    #[serde(default)]
    pub last_finished_level: u32,
}

impl ProgressRecord {
    /// Record pointing at `level`.
    #[must_use]
    pub fn new(level: u32) -> Self {
        Self {
            last_finished_level: level,
        }
    }
}
