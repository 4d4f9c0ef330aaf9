//! Append-only event log with short retention.
//!
//! Every roster change, check-in, and scheduler-driven message is recorded
//! as one [`LogEntry`]. Entries older than [`retention`] are pruned by the
//! backends on every append. The persisted field order is stable for
//! compatibility with pre-existing log files:
//! `timestamp, event, user_id, extra`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::UserId;

/// How long log entries are kept.
pub const RETENTION_DAYS: i64 = 4;

/// Retention horizon as a duration.
pub fn retention() -> Duration {
    Duration::days(RETENTION_DAYS)
}

/// The recorded event kinds. Serialized names are stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Register,
    Unregister,
    Checkin,
    CheckinRemoved,
    DailyCheckinSent,
    ReminderSent,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Register => "register",
            EventKind::Unregister => "unregister",
            EventKind::Checkin => "checkin",
            EventKind::CheckinRemoved => "checkin_removed",
            EventKind::DailyCheckinSent => "daily_checkin_sent",
            EventKind::ReminderSent => "reminder_sent",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "register" => Ok(EventKind::Register),
            "unregister" => Ok(EventKind::Unregister),
            "checkin" => Ok(EventKind::Checkin),
            "checkin_removed" => Ok(EventKind::CheckinRemoved),
            "daily_checkin_sent" => Ok(EventKind::DailyCheckinSent),
            "reminder_sent" => Ok(EventKind::ReminderSent),
            _ => Err(()),
        }
    }
}

/// Who an entry is about: a participant, or the bot itself for
/// scheduler-driven events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogActor {
    Bot,
    User(UserId),
}

impl LogActor {
    /// Parse the persisted `user_id` column.
    pub fn parse(s: &str) -> Option<Self> {
        if s == "bot" {
            Some(LogActor::Bot)
        } else {
            s.parse::<u64>().ok().map(|id| LogActor::User(UserId(id)))
        }
    }
}

impl fmt::Display for LogActor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogActor::Bot => f.write_str("bot"),
            LogActor::User(id) => id.fmt(f),
        }
    }
}

/// One immutable log record.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub at: DateTime<Utc>,
    pub event: EventKind,
    pub actor: LogActor,
    /// Free text: the reaction kind for check-ins, the comma-joined pending
    /// ids for reminders, empty otherwise.
    pub detail: String,
}

impl LogEntry {
    /// New entry stamped with the current time.
    pub fn new(event: EventKind, actor: LogActor, detail: impl Into<String>) -> Self {
        Self {
            at: Utc::now(),
            event,
            actor,
            detail: detail.into(),
        }
    }

    pub fn is_older_than(&self, cutoff: DateTime<Utc>) -> bool {
        self.at < cutoff
    }
}
