//! # cleanstreak bot runtime
//!
//! Everything platform-facing lives here: the chat gateway interface and
//! its Discord implementation, message rendering, command parsing, the two
//! fixed daily triggers, and configuration. The check-in rules themselves
//! live in `cleanstreak-core`; this crate feeds them events one at a time
//! and posts the results back to the channel.

pub mod bot;
pub mod commands;
pub mod config;
pub mod discord;
pub mod emoji;
pub mod gateway;
pub mod notifier;
pub mod scheduler;

pub use bot::Bot;
pub use config::BotConfig;
pub use gateway::{ChannelId, ChatEvent, ChatGateway, GatewayError, GuildId};
