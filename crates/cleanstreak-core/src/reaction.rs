//! Daily check-in reaction kinds.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The three valid responses to a daily prompt. Anything else arriving from
/// the platform is dropped before it reaches the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReactionKind {
    /// No relapse today.
    Clean,
    /// A near miss.
    Close,
    /// Relapsed; resets the streak.
    Relapsed,
}

impl ReactionKind {
    /// Stable label used in log entries and display text.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReactionKind::Clean => "clean",
            ReactionKind::Close => "close",
            ReactionKind::Relapsed => "relapsed",
        }
    }
}

impl fmt::Display for ReactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
