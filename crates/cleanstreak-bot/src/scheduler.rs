//! Fixed-time daily triggers.
//!
//! The next fire time is always recomputed from the current wall clock,
//! never persisted, so a process restart cannot miss or double-fire a
//! trigger: whatever the clock says, the next occurrence is exact.

use chrono::{DateTime, Duration, NaiveTime, Utc};

/// The next UTC instant at `hour:minute` strictly after `after`.
pub fn next_occurrence(after: DateTime<Utc>, hour: u32, minute: u32) -> DateTime<Utc> {
    let target = NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or_default();
    let candidate = after.date_naive().and_time(target).and_utc();
    if candidate > after {
        candidate
    } else {
        candidate + Duration::days(1)
    }
}

/// One fixed daily trigger.
#[derive(Debug, Clone, Copy)]
pub struct DailyTimer {
    hour: u32,
    minute: u32,
}

impl DailyTimer {
    pub fn new(hour: u32, minute: u32) -> Self {
        Self { hour, minute }
    }

    /// Sleep until the next occurrence and return it.
    pub async fn wait(&self) -> DateTime<Utc> {
        let now = Utc::now();
        let next = next_occurrence(now, self.hour, self.minute);
        let delay = (next - now).to_std().unwrap_or_default();
        tokio::time::sleep(delay).await;
        next
    }
}
