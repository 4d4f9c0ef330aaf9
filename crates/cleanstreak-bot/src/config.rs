//! TOML-based runtime configuration.
//!
//! Settings live at `~/.config/cleanstreak/config.toml`; every field but
//! the channel id has a default. The bot token is deliberately kept out of
//! the file and read from the environment (`CLEANSTREAK_TOKEN`, falling
//! back to `DISCORD_TOKEN`).

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Chat-platform settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Channel that hosts the roster message, prompts, and reminders.
    pub channel_id: u64,
    /// Guild used for the administrator capability check. Without it the
    /// manual trigger is denied for everyone.
    #[serde(default)]
    pub guild_id: Option<u64>,
    #[serde(default = "default_prefix")]
    pub command_prefix: String,
}

/// Daily trigger times, UTC.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_prompt_hour")]
    pub prompt_hour: u32,
    #[serde(default)]
    pub prompt_minute: u32,
    #[serde(default = "default_reminder_hour")]
    pub reminder_hour: u32,
    #[serde(default)]
    pub reminder_minute: u32,
}

/// Storage backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// JSON snapshot + CSV log file pair.
    File,
    /// Single SQLite database.
    Sqlite,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_backend")]
    pub backend: StorageBackend,
    /// Overrides the default data directory.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    pub chat: ChatConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

// Default functions
fn default_prefix() -> String {
    "!".into()
}
fn default_prompt_hour() -> u32 {
    16
}
fn default_reminder_hour() -> u32 {
    21
}
fn default_backend() -> StorageBackend {
    StorageBackend::File
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            prompt_hour: default_prompt_hour(),
            prompt_minute: 0,
            reminder_hour: default_reminder_hour(),
            reminder_minute: 0,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            data_dir: None,
        }
    }
}

impl BotConfig {
    /// Load and parse the config file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        toml::from_str(&raw)
            .with_context(|| format!("failed to parse config at {}", path.display()))
    }

    /// `~/.config/cleanstreak/config.toml`
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("cleanstreak")
            .join("config.toml")
    }
}

/// The bot token, from `CLEANSTREAK_TOKEN` or `DISCORD_TOKEN`.
pub fn token_from_env() -> anyhow::Result<String> {
    std::env::var("CLEANSTREAK_TOKEN")
        .or_else(|_| std::env::var("DISCORD_TOKEN"))
        .context("no bot token: set CLEANSTREAK_TOKEN (or DISCORD_TOKEN)")
}
