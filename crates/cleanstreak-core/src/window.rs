//! Daily check-in window state machine.

use chrono::NaiveDate;

use crate::ids::MessageId;

/// The currently active check-in day, if any.
///
/// At most one window is open at a time; opening a new one replaces the
/// previous window wholesale. A window opened on an earlier date (e.g.
/// held across a process restart) is treated as closed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DayWindow {
    #[default]
    Closed,
    Open { date: NaiveDate, prompt: MessageId },
}

impl DayWindow {
    /// Open a window for `today`, unconditionally replacing any prior one.
    pub fn open(&mut self, prompt: MessageId, today: NaiveDate) {
        *self = DayWindow::Open {
            date: today,
            prompt,
        };
    }

    /// True only for an open window whose date matches `today`.
    pub fn is_open_for(&self, today: NaiveDate) -> bool {
        matches!(self, DayWindow::Open { date, .. } if *date == today)
    }

    /// The outstanding prompt message, if a window exists at all.
    pub fn prompt(&self) -> Option<MessageId> {
        match self {
            DayWindow::Closed => None,
            DayWindow::Open { prompt, .. } => Some(*prompt),
        }
    }
}
