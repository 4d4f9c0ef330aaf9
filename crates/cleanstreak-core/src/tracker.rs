//! The coordinating check-in state machine.
//!
//! [`CheckinTracker`] is the single owner of all mutable challenge state:
//! the roster, the daily window, and the per-window response map. Callers
//! feed it one event at a time; each mutation validates, computes the new
//! state, persists it, and only then commits in memory, so a failed write
//! never leaves memory and storage disagreeing.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::error::Result;
use crate::ids::{MessageId, UserId};
use crate::log::{EventKind, LogActor, LogEntry};
use crate::reaction::ReactionKind;
use crate::roster::Roster;
use crate::store::Store;
use crate::streak::StreakRecord;
use crate::window::DayWindow;

/// Why a reaction event was dropped. None of these are errors and none
/// of them write anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The reacting user is not on the roster.
    NotAMember,
    /// No window is open for today's date.
    WindowClosed,
    /// The participant already responded today; the first reaction is
    /// authoritative.
    AlreadyResponded,
    /// A removal arrived for a participant with no recorded response.
    NoResponse,
}

/// Result of applying one reaction event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckinOutcome {
    Applied {
        user: UserId,
        kind: ReactionKind,
        record: StreakRecord,
    },
    Ignored(IgnoreReason),
}

/// The challenge state object. All mutation is routed through here,
/// serialized by the caller (single-writer).
///
/// Generic over the store so the backend stays a deployment concern;
/// the runtime uses `CheckinTracker<Box<dyn Store>>`.
pub struct CheckinTracker<S: Store> {
    store: S,
    roster: Roster,
    window: DayWindow,
    responses: HashMap<UserId, ReactionKind>,
}

impl<S: Store> CheckinTracker<S> {
    /// Load durable state (roster) from the store. The window and the
    /// response map always start empty: a window from a previous process
    /// run fails the date check anyway.
    pub fn load(store: S) -> Result<Self> {
        let roster = Roster::load(&store)?;
        Ok(Self {
            store,
            roster,
            window: DayWindow::Closed,
            responses: HashMap::new(),
        })
    }

    // ── Roster ───────────────────────────────────────────────────────

    /// Add a participant; `true` if membership changed.
    pub fn join(&mut self, user: UserId) -> Result<bool> {
        self.roster.join(&mut self.store, user)
    }

    /// Remove a participant; `true` if membership changed.
    pub fn leave(&mut self, user: UserId) -> Result<bool> {
        self.roster.leave(&mut self.store, user)
    }

    pub fn is_member(&self, user: UserId) -> bool {
        self.roster.is_member(user)
    }

    /// Members in ascending id order.
    pub fn members(&self) -> Vec<UserId> {
        self.roster.members().collect()
    }

    // ── Window ───────────────────────────────────────────────────────

    /// Open today's window for a freshly sent prompt, discarding all
    /// responses from any prior window.
    pub fn open_window(&mut self, prompt: MessageId, today: NaiveDate) -> Result<()> {
        self.window.open(prompt, today);
        self.responses.clear();
        self.store.append_log(&LogEntry::new(
            EventKind::DailyCheckinSent,
            LogActor::Bot,
            "",
        ))
    }

    pub fn is_open_for(&self, today: NaiveDate) -> bool {
        self.window.is_open_for(today)
    }

    /// The outstanding prompt message, used to route incoming reactions.
    pub fn prompt(&self) -> Option<MessageId> {
        self.window.prompt()
    }

    // ── Check-ins ────────────────────────────────────────────────────

    /// Apply a reaction-added event.
    pub fn apply_add(
        &mut self,
        user: UserId,
        kind: ReactionKind,
        today: NaiveDate,
    ) -> Result<CheckinOutcome> {
        if !self.roster.is_member(user) {
            return Ok(CheckinOutcome::Ignored(IgnoreReason::NotAMember));
        }
        if !self.window.is_open_for(today) {
            return Ok(CheckinOutcome::Ignored(IgnoreReason::WindowClosed));
        }
        if self.responses.contains_key(&user) {
            return Ok(CheckinOutcome::Ignored(IgnoreReason::AlreadyResponded));
        }

        let mut record = self.store.get_streak(user)?.unwrap_or_default();
        record.apply(kind);
        self.store.put_streak(user, record)?;
        self.store.append_log(&LogEntry::new(
            EventKind::Checkin,
            LogActor::User(user),
            kind.as_str(),
        ))?;
        self.responses.insert(user, kind);
        Ok(CheckinOutcome::Applied { user, kind, record })
    }

    /// Apply a reaction-removed event, re-opening the participant's slot
    /// for a fresh response.
    pub fn apply_remove(
        &mut self,
        user: UserId,
        kind: ReactionKind,
        today: NaiveDate,
    ) -> Result<CheckinOutcome> {
        if !self.roster.is_member(user) {
            return Ok(CheckinOutcome::Ignored(IgnoreReason::NotAMember));
        }
        if !self.window.is_open_for(today) {
            return Ok(CheckinOutcome::Ignored(IgnoreReason::WindowClosed));
        }
        if !self.responses.contains_key(&user) {
            return Ok(CheckinOutcome::Ignored(IgnoreReason::NoResponse));
        }

        let mut record = self.store.get_streak(user)?.unwrap_or_default();
        record.revert(kind);
        self.store.put_streak(user, record)?;
        self.store.append_log(&LogEntry::new(
            EventKind::CheckinRemoved,
            LogActor::User(user),
            kind.as_str(),
        ))?;
        self.responses.remove(&user);
        Ok(CheckinOutcome::Applied { user, kind, record })
    }

    /// The response a participant gave for the current window, if any.
    pub fn response(&self, user: UserId) -> Option<ReactionKind> {
        self.responses.get(&user).copied()
    }

    /// Roster members without a response in the current window, ascending.
    pub fn pending(&self) -> Vec<UserId> {
        self.roster
            .members()
            .filter(|user| !self.responses.contains_key(user))
            .collect()
    }

    /// Record that a reminder went out to `pending`.
    pub fn note_reminder(&mut self, pending: &[UserId]) -> Result<()> {
        let detail = pending
            .iter()
            .map(|user| user.to_string())
            .collect::<Vec<_>>()
            .join(",");
        self.store
            .append_log(&LogEntry::new(EventKind::ReminderSent, LogActor::Bot, detail))
    }

    /// A participant's counters, defaulting to zeros if they have never
    /// checked in.
    pub fn streak_of(&self, user: UserId) -> Result<StreakRecord> {
        Ok(self.store.get_streak(user)?.unwrap_or_default())
    }

    /// Retained log entries, oldest first.
    pub fn recent_logs(&self) -> Result<Vec<LogEntry>> {
        self.store.recent_logs()
    }
}
