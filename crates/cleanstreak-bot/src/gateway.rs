//! Chat platform interface.
//!
//! The runtime consumes the platform through this narrow surface: inbound
//! [`ChatEvent`]s delivered over a channel, outbound operations behind the
//! [`ChatGateway`] trait. The engine never sees any of this; it only
//! receives ids and reaction kinds.

use std::fmt;

use cleanstreak_core::{MessageId, UserId};
use thiserror::Error;

/// Channel hosting the roster, prompts, and reminders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelId(pub u64);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Guild (server) the bot operates in; used for the administrator check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GuildId(pub u64);

impl fmt::Display for GuildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Inbound platform events, already filtered of the bot's own actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    Ready {
        bot_user: UserId,
    },
    ReactionAdded {
        message: MessageId,
        user: UserId,
        emoji: String,
    },
    ReactionRemoved {
        message: MessageId,
        user: UserId,
        emoji: String,
    },
    Message {
        channel: ChannelId,
        author: UserId,
        content: String,
    },
}

/// Outbound-operation failures.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// The platform rejected the operation (bad permissions, unknown
    /// message, rate limit).
    #[error("delivery rejected (HTTP {status}): {body}")]
    Delivery { status: u16, body: String },

    /// The request never completed.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The platform answered with something we could not interpret.
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Outbound chat operations.
///
/// Futures are awaited on the single event-loop task, so no `Send` bound
/// is required of implementations.
#[allow(async_fn_in_trait)]
pub trait ChatGateway {
    /// Post a message; returns its platform id.
    async fn send_message(&self, channel: ChannelId, text: &str)
        -> Result<MessageId, GatewayError>;

    /// Replace the text of an existing message.
    async fn edit_message(
        &self,
        channel: ChannelId,
        message: MessageId,
        text: &str,
    ) -> Result<(), GatewayError>;

    /// Attach a reaction affordance to a message.
    async fn add_reaction(
        &self,
        channel: ChannelId,
        message: MessageId,
        emoji: &str,
    ) -> Result<(), GatewayError>;

    /// Resolve a display name, falling back to `User(<id>)` when the
    /// platform lookup fails.
    async fn display_name(&self, user: UserId) -> String;

    /// Whether the user holds the administrator capability.
    async fn is_administrator(&self, user: UserId) -> Result<bool, GatewayError>;
}
