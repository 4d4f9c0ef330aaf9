//! Event handling.
//!
//! [`Bot`] glues the engine to the platform: it routes inbound events one
//! at a time (single-writer, per the concurrency model), renders outbound
//! messages, and owns the refs of the two outstanding messages (roster and
//! prompt). No failure here is fatal to the process; persistence errors
//! abort the triggering event and delivery errors leave internal state
//! authoritative until the next successful render.

use chrono::Utc;
use tracing::{debug, error, info, warn};

use cleanstreak_core::{CheckinOutcome, CheckinTracker, MessageId, Store, UserId};

use crate::commands::{self, Command};
use crate::config::ChatConfig;
use crate::emoji;
use crate::gateway::{ChannelId, ChatEvent, ChatGateway};
use crate::notifier;

/// The tracker as deployed: backend chosen at startup.
pub type Tracker = CheckinTracker<Box<dyn Store>>;

pub struct Bot<G> {
    gateway: G,
    tracker: Tracker,
    channel: ChannelId,
    prefix: String,
    bot_user: Option<UserId>,
    roster_message: Option<MessageId>,
}

impl<G: ChatGateway> Bot<G> {
    pub fn new(gateway: G, tracker: Tracker, chat: &ChatConfig) -> Self {
        Self {
            gateway,
            tracker,
            channel: ChannelId(chat.channel_id),
            prefix: chat.command_prefix.clone(),
            bot_user: None,
            roster_message: None,
        }
    }

    /// Handle one inbound event. Never propagates: errors are logged and
    /// the event is dropped, isolated from every other event.
    pub async fn handle_event(&mut self, event: ChatEvent) {
        match event {
            ChatEvent::Ready { bot_user } => {
                self.bot_user = Some(bot_user);
                info!(user = %bot_user, "gateway ready");
            }
            ChatEvent::ReactionAdded {
                message,
                user,
                emoji,
            } => self.on_reaction(message, user, &emoji, true).await,
            ChatEvent::ReactionRemoved {
                message,
                user,
                emoji,
            } => self.on_reaction(message, user, &emoji, false).await,
            ChatEvent::Message {
                channel,
                author,
                content,
            } => self.on_message(channel, author, &content).await,
        }
    }

    async fn on_reaction(&mut self, message: MessageId, user: UserId, emoji: &str, added: bool) {
        if self.bot_user == Some(user) {
            return;
        }

        if self.roster_message == Some(message) {
            if emoji != emoji::JOIN {
                return;
            }
            let changed = if added {
                self.tracker.join(user)
            } else {
                self.tracker.leave(user)
            };
            match changed {
                Ok(true) => {
                    debug!(%user, added, "roster changed");
                    self.render_roster().await;
                }
                Ok(false) => {}
                Err(e) => error!(%user, "roster update failed: {e}"),
            }
            return;
        }

        if self.tracker.prompt() == Some(message) {
            let Some(kind) = emoji::reaction_kind(emoji) else {
                return;
            };
            let today = Utc::now().date_naive();
            let outcome = if added {
                self.tracker.apply_add(user, kind, today)
            } else {
                self.tracker.apply_remove(user, kind, today)
            };
            match outcome {
                Ok(CheckinOutcome::Applied { record, .. }) => {
                    debug!(%user, %kind, added, streak = record.streak, "check-in applied");
                }
                Ok(CheckinOutcome::Ignored(reason)) => {
                    debug!(%user, %kind, added, ?reason, "check-in ignored");
                }
                Err(e) => error!(%user, "check-in persistence failed: {e}"),
            }
        }
    }

    async fn on_message(&mut self, channel: ChannelId, author: UserId, content: &str) {
        if channel != self.channel || self.bot_user == Some(author) {
            return;
        }
        let Some(command) = commands::parse(&self.prefix, content) else {
            return;
        };
        match command {
            Command::PostRoster => self.post_roster().await,
            Command::MyStreak => self.reply_streak(author).await,
            Command::TriggerCheckin => self.trigger_checkin(author).await,
        }
    }

    async fn reply_streak(&mut self, author: UserId) {
        let record = match self.tracker.streak_of(author) {
            Ok(record) => record,
            Err(e) => {
                error!(%author, "streak lookup failed: {e}");
                return;
            }
        };
        let name = self.gateway.display_name(author).await;
        let text = notifier::streak_reply(&name, &record);
        if let Err(e) = self.gateway.send_message(self.channel, &text).await {
            warn!("streak reply not delivered: {e}");
        }
    }

    async fn trigger_checkin(&mut self, author: UserId) {
        match self.gateway.is_administrator(author).await {
            Ok(true) => self.post_daily_prompt().await,
            Ok(false) => {
                let name = self.gateway.display_name(author).await;
                let text = notifier::not_an_admin_reply(&name);
                if let Err(e) = self.gateway.send_message(self.channel, &text).await {
                    warn!("capability reply not delivered: {e}");
                }
            }
            Err(e) => warn!(%author, "administrator check failed: {e}"),
        }
    }

    /// Post the opt-in roster message and remember its ref.
    pub async fn post_roster(&mut self) {
        let text = self.rendered_roster().await;
        match self.gateway.send_message(self.channel, &text).await {
            Ok(message) => {
                if let Err(e) = self
                    .gateway
                    .add_reaction(self.channel, message, emoji::JOIN)
                    .await
                {
                    warn!("join affordance not attached: {e}");
                }
                self.roster_message = Some(message);
            }
            Err(e) => error!("roster message not delivered: {e}"),
        }
    }

    /// Send the daily prompt and open today's window.
    pub async fn post_daily_prompt(&mut self) {
        let text = notifier::prompt_message();
        let message = match self.gateway.send_message(self.channel, &text).await {
            Ok(message) => message,
            Err(e) => {
                // No prompt, no window: yesterday's window (if any) stays
                // in place and keeps failing the date check.
                error!("daily prompt not delivered: {e}");
                return;
            }
        };
        for affordance in emoji::PROMPT_SET {
            if let Err(e) = self
                .gateway
                .add_reaction(self.channel, message, affordance)
                .await
            {
                warn!("prompt affordance not attached: {e}");
            }
        }
        let today = Utc::now().date_naive();
        if let Err(e) = self.tracker.open_window(message, today) {
            error!("window open not logged: {e}");
        }
        info!(%message, %today, "daily prompt posted");
    }

    /// Mention everyone still pending; silent no-op when nobody is.
    pub async fn post_evening_reminder(&mut self) {
        let pending = self.tracker.pending();
        if pending.is_empty() {
            debug!("no pending members, skipping reminder");
            return;
        }
        let text = notifier::reminder_message(&pending);
        match self.gateway.send_message(self.channel, &text).await {
            Ok(_) => {
                if let Err(e) = self.tracker.note_reminder(&pending) {
                    error!("reminder not logged: {e}");
                }
                info!(count = pending.len(), "reminder posted");
            }
            Err(e) => error!("reminder not delivered: {e}"),
        }
    }

    async fn rendered_roster(&self) -> String {
        let mut names = Vec::new();
        for user in self.tracker.members() {
            names.push(self.gateway.display_name(user).await);
        }
        notifier::roster_message(&names)
    }

    async fn render_roster(&mut self) {
        let Some(message) = self.roster_message else {
            return;
        };
        let text = self.rendered_roster().await;
        if let Err(e) = self.gateway.edit_message(self.channel, message, &text).await {
            // Internal state already changed; the next successful render
            // catches the display up.
            warn!("roster render failed: {e}");
        }
    }

    /// The engine state, for inspection.
    pub fn tracker(&self) -> &Tracker {
        &self.tracker
    }

    /// The outbound gateway, for inspection.
    pub fn gateway(&self) -> &G {
        &self.gateway
    }
}
