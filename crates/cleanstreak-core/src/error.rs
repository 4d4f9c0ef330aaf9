//! Core error types for cleanstreak-core.

use std::path::PathBuf;
use thiserror::Error;

/// Storage-port errors.
///
/// Every variant is surfaced to the caller unchanged; the engine never
/// retries on its own. A failed write aborts the triggering operation
/// before any in-memory state is committed.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open or create a backend
    #[error("failed to open store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// SQLite query or migration failed
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Filesystem read/write failed
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot (de)serialization failed
    #[error("snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),

    /// Event-log read/write failed
    #[error("event log error: {0}")]
    Log(#[from] csv::Error),
}

/// Result type alias for storage-backed operations.
pub type Result<T, E = StoreError> = std::result::Result<T, E>;
