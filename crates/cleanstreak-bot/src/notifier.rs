//! Outbound message rendering.

use cleanstreak_core::{StreakRecord, UserId};

use crate::emoji;

/// Shown in the roster message when nobody has joined.
pub const EMPTY_ROSTER: &str = "No participants yet.";

/// The opt-in roster message, listing current members by display name.
pub fn roster_message(names: &[String]) -> String {
    let list = if names.is_empty() {
        EMPTY_ROSTER.to_string()
    } else {
        names
            .iter()
            .map(|name| format!("- {name}"))
            .collect::<Vec<_>>()
            .join("\n")
    };
    format!(
        "React with {join} to join the challenge! Remove {join} to leave.\n\n**Participants:**\n{list}",
        join = emoji::JOIN,
    )
}

/// The daily prompt text.
pub fn prompt_message() -> String {
    format!(
        "Did you relapse today? React with:\n{clean} for no\n{close} for almost\n{relapsed} for yes",
        clean = emoji::CLEAN,
        close = emoji::CLOSE,
        relapsed = emoji::RELAPSED,
    )
}

/// The evening reminder, mentioning everyone still pending.
pub fn reminder_message(pending: &[UserId]) -> String {
    let mentions = pending
        .iter()
        .map(|user| format!("<@{user}>"))
        .collect::<Vec<_>>()
        .join(" ");
    format!("Reminder for those who haven't checked in today: {mentions}")
}

/// The `!streak` reply.
pub fn streak_reply(name: &str, record: &StreakRecord) -> String {
    format!(
        "{name}, your streak is {streak} clean days \u{1f525} and {almost} 'almost' days {close}.",
        streak = record.streak,
        almost = record.almost_count,
        close = emoji::CLOSE,
    )
}

/// Reply to a non-administrator invoking the manual trigger.
pub fn not_an_admin_reply(name: &str) -> String {
    format!("{name}, only an administrator can trigger the daily check-in.")
}
