//! # cleanstreak core library
//!
//! This library provides the core logic for the cleanstreak daily check-in
//! challenge: a group of participants opts into a recurring "did you relapse
//! today?" ritual, responds once per day, and accumulates per-user streak
//! counters. The chat platform, the daily timers, and process bootstrap all
//! live in the runtime crate; this crate only knows opaque ids, reaction
//! kinds, and a narrow storage port.
//!
//! ## Architecture
//!
//! - **Tracker**: a single coordinating state object owning the roster, the
//!   daily check-in window, and the per-window response map. All mutation
//!   goes through it, one event at a time.
//! - **Storage**: the [`Store`] port with three interchangeable backends
//!   (in-memory, JSON-snapshot + CSV-log file pair, SQLite). Backend choice
//!   is a deployment concern.
//! - **Event log**: append-only records with a short retention horizon,
//!   pruned on every append.
//!
//! ## Key Components
//!
//! - [`CheckinTracker`]: the check-in state machine
//! - [`StreakRecord`]: per-participant counters and their mutation rules
//! - [`Store`]: persistence port

pub mod error;
pub mod ids;
pub mod log;
pub mod reaction;
pub mod roster;
pub mod store;
pub mod streak;
pub mod tracker;
pub mod window;

pub use error::{Result, StoreError};
pub use ids::{MessageId, UserId};
pub use log::{EventKind, LogActor, LogEntry};
pub use reaction::ReactionKind;
pub use roster::Roster;
pub use store::{FileStore, MemoryStore, SqliteStore, Store};
pub use streak::StreakRecord;
pub use tracker::{CheckinOutcome, CheckinTracker, IgnoreReason};
pub use window::DayWindow;
