//! Per-participant streak state.

use serde::{Deserialize, Serialize};

use crate::reaction::ReactionKind;

/// Streak counters for one participant.
///
/// Created lazily with both counters at zero on first check-in and never
/// deleted afterwards, so history survives a participant leaving the
/// roster. `streak` counts consecutive clean days; `almost_count`
/// accumulates near misses and persists across relapses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakRecord {
    #[serde(default)]
    pub streak: u32,
    #[serde(default)]
    pub almost_count: u32,
}

impl StreakRecord {
    /// Apply one check-in response.
    pub fn apply(&mut self, kind: ReactionKind) {
        match kind {
            ReactionKind::Clean => self.streak += 1,
            ReactionKind::Close => self.almost_count += 1,
            ReactionKind::Relapsed => self.streak = 0,
        }
    }

    /// Undo a previously applied response.
    ///
    /// Removing a relapse does not restore the streak it wiped: the count
    /// that was lost is not recoverable, so a relapse cannot be taken back
    /// by toggling the reaction.
    pub fn revert(&mut self, kind: ReactionKind) {
        match kind {
            ReactionKind::Clean => self.streak = self.streak.saturating_sub(1),
            ReactionKind::Close => self.almost_count = self.almost_count.saturating_sub(1),
            ReactionKind::Relapsed => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_increments_streak() {
        let mut record = StreakRecord::default();
        record.apply(ReactionKind::Clean);
        record.apply(ReactionKind::Clean);
        assert_eq!(record.streak, 2);
        assert_eq!(record.almost_count, 0);
    }

    #[test]
    fn close_increments_almost_only() {
        let mut record = StreakRecord::default();
        record.apply(ReactionKind::Close);
        assert_eq!(record.streak, 0);
        assert_eq!(record.almost_count, 1);
    }

    #[test]
    fn relapse_resets_streak_keeps_almost() {
        let mut record = StreakRecord {
            streak: 7,
            almost_count: 2,
        };
        record.apply(ReactionKind::Relapsed);
        assert_eq!(record.streak, 0);
        assert_eq!(record.almost_count, 2);
    }

    #[test]
    fn revert_restores_clean_and_close() {
        let mut record = StreakRecord {
            streak: 3,
            almost_count: 1,
        };
        record.apply(ReactionKind::Clean);
        record.revert(ReactionKind::Clean);
        assert_eq!(record.streak, 3);

        record.apply(ReactionKind::Close);
        record.revert(ReactionKind::Close);
        assert_eq!(record.almost_count, 1);
    }

    #[test]
    fn revert_floors_at_zero() {
        let mut record = StreakRecord::default();
        record.revert(ReactionKind::Clean);
        record.revert(ReactionKind::Close);
        assert_eq!(record, StreakRecord::default());
    }

    #[test]
    fn revert_relapse_does_not_restore_streak() {
        let mut record = StreakRecord {
            streak: 3,
            almost_count: 0,
        };
        record.apply(ReactionKind::Relapsed);
        record.revert(ReactionKind::Relapsed);
        assert_eq!(record.streak, 0);
    }
}
