//! SQLite backend.
//!
//! One database file (`cleanstreak.db`) with three tables: `roster`,
//! `streaks`, and `log`. Timestamps are stored as RFC 3339 UTC text, so
//! range comparisons work as plain string comparisons.

use std::collections::BTreeSet;
use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection};

use crate::error::{Result, StoreError};
use crate::ids::UserId;
use crate::log::{retention, EventKind, LogActor, LogEntry};
use crate::store::Store;
use crate::streak::StreakRecord;

const DB_FILE: &str = "cleanstreak.db";

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) `cleanstreak.db` inside `dir`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir).map_err(|source| StoreError::OpenFailed {
            path: dir.to_path_buf(),
            source: Box::new(source),
        })?;
        let path = dir.join(DB_FILE);
        let conn = Connection::open(&path).map_err(|source| StoreError::OpenFailed {
            path,
            source: Box::new(source),
        })?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS roster (
                user_id     INTEGER PRIMARY KEY
            );

            CREATE TABLE IF NOT EXISTS streaks (
                user_id      INTEGER PRIMARY KEY,
                streak       INTEGER NOT NULL,
                almost_count INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS log (
                id      INTEGER PRIMARY KEY AUTOINCREMENT,
                at      TEXT NOT NULL,
                event   TEXT NOT NULL,
                user_id TEXT NOT NULL,
                extra   TEXT NOT NULL DEFAULT ''
            );

            CREATE INDEX IF NOT EXISTS idx_log_at ON log(at);",
        )?;
        Ok(())
    }
}

impl Store for SqliteStore {
    fn load_roster(&self) -> Result<BTreeSet<UserId>> {
        let mut stmt = self.conn.prepare("SELECT user_id FROM roster")?;
        let rows = stmt.query_map([], |row| row.get::<_, i64>(0))?;
        let mut roster = BTreeSet::new();
        for row in rows {
            roster.insert(UserId(row? as u64));
        }
        Ok(roster)
    }

    fn add_to_roster(&mut self, user: UserId) -> Result<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO roster (user_id) VALUES (?1)",
            params![user.0 as i64],
        )?;
        Ok(())
    }

    fn remove_from_roster(&mut self, user: UserId) -> Result<()> {
        self.conn.execute(
            "DELETE FROM roster WHERE user_id = ?1",
            params![user.0 as i64],
        )?;
        Ok(())
    }

    fn get_streak(&self, user: UserId) -> Result<Option<StreakRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT streak, almost_count FROM streaks WHERE user_id = ?1")?;
        let result = stmt.query_row(params![user.0 as i64], |row| {
            Ok(StreakRecord {
                streak: row.get::<_, i64>(0)? as u32,
                almost_count: row.get::<_, i64>(1)? as u32,
            })
        });
        match result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put_streak(&mut self, user: UserId, record: StreakRecord) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO streaks (user_id, streak, almost_count)
             VALUES (?1, ?2, ?3)",
            params![user.0 as i64, record.streak as i64, record.almost_count as i64],
        )?;
        Ok(())
    }

    fn append_log(&mut self, entry: &LogEntry) -> Result<()> {
        self.conn.execute(
            "INSERT INTO log (at, event, user_id, extra) VALUES (?1, ?2, ?3, ?4)",
            params![
                entry.at.to_rfc3339(),
                entry.event.as_str(),
                entry.actor.to_string(),
                entry.detail,
            ],
        )?;
        self.prune_logs_older_than(retention())
    }

    fn prune_logs_older_than(&mut self, horizon: Duration) -> Result<()> {
        let cutoff = (Utc::now() - horizon).to_rfc3339();
        self.conn
            .execute("DELETE FROM log WHERE at < ?1", params![cutoff])?;
        Ok(())
    }

    fn recent_logs(&self) -> Result<Vec<LogEntry>> {
        let mut stmt = self
            .conn
            .prepare("SELECT at, event, user_id, extra FROM log ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (at, event, actor, detail) = row?;
            let parsed = DateTime::parse_from_rfc3339(&at)
                .ok()
                .map(|at| at.with_timezone(&Utc));
            let event = event.parse::<EventKind>().ok();
            let actor = LogActor::parse(&actor);
            if let (Some(at), Some(event), Some(actor)) = (parsed, event, actor) {
                entries.push(LogEntry {
                    at,
                    event,
                    actor,
                    detail,
                });
            }
        }
        Ok(entries)
    }
}
