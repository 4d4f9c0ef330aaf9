//! Challenge roster membership.

use std::collections::BTreeSet;

use crate::error::Result;
use crate::ids::UserId;
use crate::log::{EventKind, LogActor, LogEntry};
use crate::store::Store;

/// The membership set of participants, kept in sync with the store.
///
/// Both mutations are idempotent and persist before committing the
/// in-memory set, so a failed write leaves memory and storage agreeing.
#[derive(Debug, Default)]
pub struct Roster {
    members: BTreeSet<UserId>,
}

impl Roster {
    /// Load the membership set from the store.
    pub fn load<S: Store + ?Sized>(store: &S) -> Result<Self> {
        Ok(Self {
            members: store.load_roster()?,
        })
    }

    /// Add a participant. Returns `false` (and writes nothing, logs
    /// nothing) if already a member.
    pub fn join<S: Store + ?Sized>(&mut self, store: &mut S, user: UserId) -> Result<bool> {
        if self.members.contains(&user) {
            return Ok(false);
        }
        store.add_to_roster(user)?;
        store.append_log(&LogEntry::new(
            EventKind::Register,
            LogActor::User(user),
            "",
        ))?;
        self.members.insert(user);
        Ok(true)
    }

    /// Remove a participant. Returns `false` if not a member.
    pub fn leave<S: Store + ?Sized>(&mut self, store: &mut S, user: UserId) -> Result<bool> {
        if !self.members.contains(&user) {
            return Ok(false);
        }
        store.remove_from_roster(user)?;
        store.append_log(&LogEntry::new(
            EventKind::Unregister,
            LogActor::User(user),
            "",
        ))?;
        self.members.remove(&user);
        Ok(true)
    }

    pub fn is_member(&self, user: UserId) -> bool {
        self.members.contains(&user)
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Members in ascending id order, stable for display.
    pub fn members(&self) -> impl Iterator<Item = UserId> + '_ {
        self.members.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn join_and_leave_are_idempotent() {
        let mut store = MemoryStore::new();
        let mut roster = Roster::default();

        assert!(roster.join(&mut store, UserId(42)).unwrap());
        assert!(!roster.join(&mut store, UserId(42)).unwrap());
        assert!(roster.is_member(UserId(42)));

        assert!(roster.leave(&mut store, UserId(42)).unwrap());
        assert!(!roster.leave(&mut store, UserId(42)).unwrap());
        assert!(!roster.is_member(UserId(42)));

        // One register and one unregister entry, no duplicates.
        let logs = store.recent_logs().unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].event, EventKind::Register);
        assert_eq!(logs[1].event, EventKind::Unregister);
    }

    #[test]
    fn members_are_sorted_ascending() {
        let mut store = MemoryStore::new();
        let mut roster = Roster::default();
        for id in [30, 10, 20] {
            roster.join(&mut store, UserId(id)).unwrap();
        }
        let listed: Vec<_> = roster.members().collect();
        assert_eq!(listed, vec![UserId(10), UserId(20), UserId(30)]);
    }

    #[test]
    fn failed_write_leaves_membership_unchanged() {
        let mut store = MemoryStore::new();
        let mut roster = Roster::default();

        store.fail_next_write();
        assert!(roster.join(&mut store, UserId(42)).is_err());
        assert!(!roster.is_member(UserId(42)));
    }

    #[test]
    fn load_restores_from_store() {
        let mut store = MemoryStore::new();
        store.add_to_roster(UserId(5)).unwrap();
        let roster = Roster::load(&store).unwrap();
        assert!(roster.is_member(UserId(5)));
    }
}
