//! Durable local file pair: JSON snapshot + CSV append log.
//!
//! The snapshot (`cleanstreak_data.json`) holds the roster and the streak
//! map and is rewritten whole on every mutation, via a temp file and
//! rename. The event log (`cleanstreak_log.csv`) is append-only with a
//! header row and is pruned by rewriting; rows whose timestamp fails to
//! parse are conservatively retained.

use std::collections::{BTreeSet, HashMap};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};
use crate::ids::UserId;
use crate::log::{retention, EventKind, LogActor, LogEntry};
use crate::store::Store;
use crate::streak::StreakRecord;

const SNAPSHOT_FILE: &str = "cleanstreak_data.json";
const LOG_FILE: &str = "cleanstreak_log.csv";
const LOG_HEADER: [&str; 4] = ["timestamp", "event", "user_id", "extra"];

/// A streak value as found in a snapshot. Older snapshots stored the
/// streak as a bare integer with no almost counter.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum StoredStreak {
    Record(StreakRecord),
    Legacy(u32),
}

impl StoredStreak {
    fn into_record(self) -> StreakRecord {
        match self {
            StoredStreak::Record(record) => record,
            StoredStreak::Legacy(streak) => StreakRecord {
                streak,
                almost_count: 0,
            },
        }
    }
}

#[derive(Serialize, Deserialize, Default)]
struct Snapshot {
    #[serde(default)]
    registered_users: BTreeSet<UserId>,
    #[serde(default)]
    streaks: HashMap<String, StoredStreak>,
}

/// File-pair backend.
pub struct FileStore {
    snapshot_path: PathBuf,
    log_path: PathBuf,
    roster: BTreeSet<UserId>,
    streaks: HashMap<UserId, StreakRecord>,
}

impl FileStore {
    /// Open (or initialize) the store inside `dir`.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created or an existing
    /// snapshot cannot be parsed. A corrupt snapshot is an error, not a
    /// silent reset.
    pub fn open(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir).map_err(|source| StoreError::OpenFailed {
            path: dir.to_path_buf(),
            source: Box::new(source),
        })?;

        let snapshot_path = dir.join(SNAPSHOT_FILE);
        let log_path = dir.join(LOG_FILE);

        let mut roster = BTreeSet::new();
        let mut streaks = HashMap::new();
        if snapshot_path.exists() {
            let raw = fs::read_to_string(&snapshot_path)?;
            let snapshot: Snapshot = serde_json::from_str(&raw)?;
            roster = snapshot.registered_users;
            streaks = snapshot
                .streaks
                .into_iter()
                .filter_map(|(key, value)| {
                    key.parse::<u64>()
                        .ok()
                        .map(|id| (UserId(id), value.into_record()))
                })
                .collect();
        }

        Ok(Self {
            snapshot_path,
            log_path,
            roster,
            streaks,
        })
    }

    fn save_snapshot(&self) -> Result<()> {
        let snapshot = Snapshot {
            registered_users: self.roster.clone(),
            streaks: self
                .streaks
                .iter()
                .map(|(id, record)| (id.to_string(), StoredStreak::Record(*record)))
                .collect(),
        };
        let raw = serde_json::to_string_pretty(&snapshot)?;
        let tmp = self.snapshot_path.with_extension("json.tmp");
        fs::write(&tmp, raw)?;
        fs::rename(&tmp, &self.snapshot_path)?;
        Ok(())
    }

    fn parse_row(record: &csv::StringRecord) -> Option<LogEntry> {
        let at = DateTime::parse_from_rfc3339(record.get(0)?)
            .ok()?
            .with_timezone(&Utc);
        let event: EventKind = record.get(1)?.parse().ok()?;
        let actor = LogActor::parse(record.get(2)?)?;
        Some(LogEntry {
            at,
            event,
            actor,
            detail: record.get(3).unwrap_or_default().to_string(),
        })
    }
}

impl Store for FileStore {
    fn load_roster(&self) -> Result<BTreeSet<UserId>> {
        Ok(self.roster.clone())
    }

    fn add_to_roster(&mut self, user: UserId) -> Result<()> {
        if self.roster.insert(user) {
            if let Err(e) = self.save_snapshot() {
                self.roster.remove(&user);
                return Err(e);
            }
        }
        Ok(())
    }

    fn remove_from_roster(&mut self, user: UserId) -> Result<()> {
        if self.roster.remove(&user) {
            if let Err(e) = self.save_snapshot() {
                self.roster.insert(user);
                return Err(e);
            }
        }
        Ok(())
    }

    fn get_streak(&self, user: UserId) -> Result<Option<StreakRecord>> {
        Ok(self.streaks.get(&user).copied())
    }

    fn put_streak(&mut self, user: UserId, record: StreakRecord) -> Result<()> {
        let previous = self.streaks.insert(user, record);
        if let Err(e) = self.save_snapshot() {
            match previous {
                Some(previous) => self.streaks.insert(user, previous),
                None => self.streaks.remove(&user),
            };
            return Err(e);
        }
        Ok(())
    }

    fn append_log(&mut self, entry: &LogEntry) -> Result<()> {
        let new_file = !self.log_path.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if new_file {
            writer.write_record(LOG_HEADER)?;
        }
        writer.write_record([
            entry.at.to_rfc3339().as_str(),
            entry.event.as_str(),
            entry.actor.to_string().as_str(),
            entry.detail.as_str(),
        ])?;
        writer.flush()?;
        drop(writer);

        self.prune_logs_older_than(retention())
    }

    fn prune_logs_older_than(&mut self, horizon: Duration) -> Result<()> {
        if !self.log_path.exists() {
            return Ok(());
        }
        let cutoff = Utc::now() - horizon;

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&self.log_path)?;
        let mut kept: Vec<csv::StringRecord> = Vec::new();
        for record in reader.records() {
            let record = record?;
            // Header and unparseable rows never match a timestamp and are
            // kept as-is.
            let keep = match record.get(0).map(DateTime::parse_from_rfc3339) {
                Some(Ok(at)) => at.with_timezone(&Utc) >= cutoff,
                _ => true,
            };
            if keep {
                kept.push(record);
            }
        }

        let tmp = self.log_path.with_extension("csv.tmp");
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&tmp)?;
        for record in &kept {
            writer.write_record(record)?;
        }
        writer.flush()?;
        drop(writer);
        fs::rename(&tmp, &self.log_path)?;
        Ok(())
    }

    fn recent_logs(&self) -> Result<Vec<LogEntry>> {
        if !self.log_path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&self.log_path)?;
        let mut entries = Vec::new();
        for record in reader.records() {
            if let Some(entry) = Self::parse_row(&record?) {
                entries.push(entry);
            }
        }
        Ok(entries)
    }
}
