//! Persistence port and backends.
//!
//! The engine is written against the [`Store`] trait, never against a
//! concrete backend. Three interchangeable backends are provided:
//!
//! - [`MemoryStore`]: HashMap-backed, the reference semantics (tests)
//! - [`FileStore`]: JSON snapshot + CSV append log on local disk
//! - [`SqliteStore`]: single SQLite database file
//!
//! Writes are synchronous from the caller's perspective: an operation is
//! not considered handled until the write has completed or failed.

pub mod file;
pub mod memory;
pub mod sqlite;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use std::collections::BTreeSet;
use std::path::PathBuf;

use chrono::Duration;

use crate::error::{Result, StoreError};
use crate::ids::UserId;
use crate::log::LogEntry;
use crate::streak::StreakRecord;

/// Key-value/record storage for roster membership, per-user streak
/// counters, and the append-only event log.
pub trait Store: Send {
    /// Read the full membership set.
    fn load_roster(&self) -> Result<BTreeSet<UserId>>;

    /// Add one member. Re-adding an existing member is a no-op.
    fn add_to_roster(&mut self, user: UserId) -> Result<()>;

    /// Remove one member. Removing a non-member is a no-op.
    fn remove_from_roster(&mut self, user: UserId) -> Result<()>;

    /// Read one streak record, `None` if the participant has never
    /// checked in.
    fn get_streak(&self, user: UserId) -> Result<Option<StreakRecord>>;

    /// Write one streak record.
    fn put_streak(&mut self, user: UserId, record: StreakRecord) -> Result<()>;

    /// Append one entry, then prune entries older than
    /// [`crate::log::retention`] in the same call.
    fn append_log(&mut self, entry: &LogEntry) -> Result<()>;

    /// Drop entries older than `horizon`. Entries whose timestamp cannot
    /// be parsed are conservatively retained.
    fn prune_logs_older_than(&mut self, horizon: Duration) -> Result<()>;

    /// All currently retained entries, oldest first. Rows that no longer
    /// parse are skipped.
    fn recent_logs(&self) -> Result<Vec<LogEntry>>;
}

impl<S: Store + ?Sized> Store for Box<S> {
    fn load_roster(&self) -> Result<BTreeSet<UserId>> {
        (**self).load_roster()
    }

    fn add_to_roster(&mut self, user: UserId) -> Result<()> {
        (**self).add_to_roster(user)
    }

    fn remove_from_roster(&mut self, user: UserId) -> Result<()> {
        (**self).remove_from_roster(user)
    }

    fn get_streak(&self, user: UserId) -> Result<Option<StreakRecord>> {
        (**self).get_streak(user)
    }

    fn put_streak(&mut self, user: UserId, record: StreakRecord) -> Result<()> {
        (**self).put_streak(user, record)
    }

    fn append_log(&mut self, entry: &LogEntry) -> Result<()> {
        (**self).append_log(entry)
    }

    fn prune_logs_older_than(&mut self, horizon: Duration) -> Result<()> {
        (**self).prune_logs_older_than(horizon)
    }

    fn recent_logs(&self) -> Result<Vec<LogEntry>> {
        (**self).recent_logs()
    }
}

/// Returns `~/.config/cleanstreak[-dev]/` based on CLEANSTREAK_ENV.
///
/// Set CLEANSTREAK_ENV=dev to use a separate development data directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("CLEANSTREAK_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("cleanstreak-dev")
    } else {
        base_dir.join("cleanstreak")
    };

    std::fs::create_dir_all(&dir).map_err(|source| StoreError::OpenFailed {
        path: dir.clone(),
        source: Box::new(source),
    })?;
    Ok(dir)
}
