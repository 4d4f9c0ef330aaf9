//! In-memory store: reference semantics for the port, used by tests.

use std::collections::{BTreeSet, HashMap};

use chrono::{Duration, Utc};

use crate::error::Result;
use crate::ids::UserId;
use crate::log::{retention, LogEntry};
use crate::store::Store;
use crate::streak::StreakRecord;

#[derive(Debug, Default)]
pub struct MemoryStore {
    roster: BTreeSet<UserId>,
    streaks: HashMap<UserId, StreakRecord>,
    logs: Vec<LogEntry>,
    fail_next: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next write fail with an io error. Lets callers exercise
    /// the abort-without-commit path.
    pub fn fail_next_write(&mut self) {
        self.fail_next = true;
    }

    fn check_failure(&mut self) -> Result<()> {
        if self.fail_next {
            self.fail_next = false;
            return Err(std::io::Error::other("injected write failure").into());
        }
        Ok(())
    }
}

impl Store for MemoryStore {
    fn load_roster(&self) -> Result<BTreeSet<UserId>> {
        Ok(self.roster.clone())
    }

    fn add_to_roster(&mut self, user: UserId) -> Result<()> {
        self.check_failure()?;
        self.roster.insert(user);
        Ok(())
    }

    fn remove_from_roster(&mut self, user: UserId) -> Result<()> {
        self.check_failure()?;
        self.roster.remove(&user);
        Ok(())
    }

    fn get_streak(&self, user: UserId) -> Result<Option<StreakRecord>> {
        Ok(self.streaks.get(&user).copied())
    }

    fn put_streak(&mut self, user: UserId, record: StreakRecord) -> Result<()> {
        self.check_failure()?;
        self.streaks.insert(user, record);
        Ok(())
    }

    fn append_log(&mut self, entry: &LogEntry) -> Result<()> {
        self.check_failure()?;
        self.logs.push(entry.clone());
        self.prune_logs_older_than(retention())
    }

    fn prune_logs_older_than(&mut self, horizon: Duration) -> Result<()> {
        let cutoff = Utc::now() - horizon;
        self.logs.retain(|entry| !entry.is_older_than(cutoff));
        Ok(())
    }

    fn recent_logs(&self) -> Result<Vec<LogEntry>> {
        Ok(self.logs.clone())
    }
}
