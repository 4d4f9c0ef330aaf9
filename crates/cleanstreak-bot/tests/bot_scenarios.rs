//! Driver scenarios against a scripted gateway.
//!
//! These cover the full event path: platform event in, engine mutation,
//! rendered message out.

use std::cell::{Cell, RefCell};

use cleanstreak_bot::bot::Bot;
use cleanstreak_bot::config::ChatConfig;
use cleanstreak_bot::emoji;
use cleanstreak_bot::gateway::{ChannelId, ChatEvent, ChatGateway, GatewayError};
use cleanstreak_bot::notifier;
use cleanstreak_core::{
    CheckinTracker, EventKind, MemoryStore, MessageId, Store, StreakRecord, UserId,
};

const CHANNEL: u64 = 1;

#[derive(Default)]
struct MockGateway {
    next_id: Cell<u64>,
    sent: RefCell<Vec<(u64, String)>>,
    edits: RefCell<Vec<(u64, String)>>,
    reactions: RefCell<Vec<(u64, String)>>,
    admin: Cell<bool>,
}

impl MockGateway {
    fn new() -> Self {
        Self {
            next_id: Cell::new(1000),
            ..Default::default()
        }
    }

    fn sent_count(&self) -> usize {
        self.sent.borrow().len()
    }

    fn last_sent(&self) -> String {
        self.sent.borrow().last().map(|(_, text)| text.clone()).unwrap_or_default()
    }

    fn last_edit(&self) -> String {
        self.edits.borrow().last().map(|(_, text)| text.clone()).unwrap_or_default()
    }

    fn reactions_on(&self, message: MessageId) -> Vec<String> {
        self.reactions
            .borrow()
            .iter()
            .filter(|(id, _)| *id == message.0)
            .map(|(_, emoji)| emoji.clone())
            .collect()
    }
}

impl ChatGateway for MockGateway {
    async fn send_message(
        &self,
        _channel: ChannelId,
        text: &str,
    ) -> Result<MessageId, GatewayError> {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.sent.borrow_mut().push((id, text.to_string()));
        Ok(MessageId(id))
    }

    async fn edit_message(
        &self,
        _channel: ChannelId,
        message: MessageId,
        text: &str,
    ) -> Result<(), GatewayError> {
        self.edits.borrow_mut().push((message.0, text.to_string()));
        Ok(())
    }

    async fn add_reaction(
        &self,
        _channel: ChannelId,
        message: MessageId,
        emoji: &str,
    ) -> Result<(), GatewayError> {
        self.reactions
            .borrow_mut()
            .push((message.0, emoji.to_string()));
        Ok(())
    }

    async fn display_name(&self, user: UserId) -> String {
        user.to_string()
    }

    async fn is_administrator(&self, user: UserId) -> Result<bool, GatewayError> {
        let _ = user;
        Ok(self.admin.get())
    }
}

fn chat_config() -> ChatConfig {
    ChatConfig {
        channel_id: CHANNEL,
        guild_id: None,
        command_prefix: "!".into(),
    }
}

fn new_bot() -> Bot<MockGateway> {
    let store: Box<dyn Store> = Box::new(MemoryStore::new());
    let tracker = CheckinTracker::load(store).unwrap();
    Bot::new(MockGateway::new(), tracker, &chat_config())
}

fn new_bot_with_members(members: &[u64]) -> Bot<MockGateway> {
    let mut store = MemoryStore::new();
    for id in members {
        store.add_to_roster(UserId(*id)).unwrap();
    }
    let store: Box<dyn Store> = Box::new(store);
    let tracker = CheckinTracker::load(store).unwrap();
    Bot::new(MockGateway::new(), tracker, &chat_config())
}

fn count_events(bot: &Bot<MockGateway>, event: EventKind) -> usize {
    bot.tracker()
        .recent_logs()
        .unwrap()
        .iter()
        .filter(|entry| entry.event == event)
        .count()
}

#[tokio::test]
async fn roster_join_and_leave_rerender_the_message() {
    let mut bot = new_bot();
    bot.post_roster().await;

    let roster_id = MessageId(1000);
    assert!(bot.gateway().last_sent().contains(notifier::EMPTY_ROSTER));
    assert_eq!(bot.gateway().reactions_on(roster_id), vec![emoji::JOIN]);

    bot.handle_event(ChatEvent::ReactionAdded {
        message: roster_id,
        user: UserId(42),
        emoji: emoji::JOIN.into(),
    })
    .await;
    assert!(bot.tracker().is_member(UserId(42)));
    assert!(bot.gateway().last_edit().contains("- 42"));
    assert_eq!(count_events(&bot, EventKind::Register), 1);

    bot.handle_event(ChatEvent::ReactionRemoved {
        message: roster_id,
        user: UserId(42),
        emoji: emoji::JOIN.into(),
    })
    .await;
    assert!(!bot.tracker().is_member(UserId(42)));
    assert!(bot.gateway().last_edit().contains(notifier::EMPTY_ROSTER));
    assert_eq!(count_events(&bot, EventKind::Unregister), 1);
}

#[tokio::test]
async fn duplicate_join_reactions_do_not_rerender() {
    let mut bot = new_bot_with_members(&[42]);
    bot.post_roster().await;
    let roster_id = MessageId(1000);

    bot.handle_event(ChatEvent::ReactionAdded {
        message: roster_id,
        user: UserId(42),
        emoji: emoji::JOIN.into(),
    })
    .await;
    assert!(bot.gateway().edits.borrow().is_empty());
    assert_eq!(count_events(&bot, EventKind::Register), 0);
}

#[tokio::test]
async fn checkin_add_and_remove_round_trip() {
    let mut bot = new_bot_with_members(&[42]);
    bot.post_daily_prompt().await;

    let prompt = bot.tracker().prompt().expect("window should be open");
    assert_eq!(
        bot.gateway().reactions_on(prompt),
        vec![emoji::CLEAN, emoji::CLOSE, emoji::RELAPSED]
    );
    assert_eq!(count_events(&bot, EventKind::DailyCheckinSent), 1);

    bot.handle_event(ChatEvent::ReactionAdded {
        message: prompt,
        user: UserId(42),
        emoji: emoji::CLEAN.into(),
    })
    .await;
    assert_eq!(bot.tracker().streak_of(UserId(42)).unwrap().streak, 1);
    assert_eq!(count_events(&bot, EventKind::Checkin), 1);

    bot.handle_event(ChatEvent::ReactionRemoved {
        message: prompt,
        user: UserId(42),
        emoji: emoji::CLEAN.into(),
    })
    .await;
    assert_eq!(bot.tracker().streak_of(UserId(42)).unwrap().streak, 0);
    assert_eq!(count_events(&bot, EventKind::CheckinRemoved), 1);
}

#[tokio::test]
async fn removing_a_relapse_does_not_restore_the_streak() {
    let store: Box<dyn Store> = Box::new(MemoryStore::new());
    let mut tracker = CheckinTracker::load(store).unwrap();
    tracker.join(UserId(42)).unwrap();
    let mut bot = Bot::new(MockGateway::new(), tracker, &chat_config());

    // Three clean days across three prompts.
    for _ in 0..3 {
        bot.post_daily_prompt().await;
        let prompt = bot.tracker().prompt().unwrap();
        bot.handle_event(ChatEvent::ReactionAdded {
            message: prompt,
            user: UserId(42),
            emoji: emoji::CLEAN.into(),
        })
        .await;
    }
    assert_eq!(bot.tracker().streak_of(UserId(42)).unwrap().streak, 3);

    bot.post_daily_prompt().await;
    let prompt = bot.tracker().prompt().unwrap();
    bot.handle_event(ChatEvent::ReactionAdded {
        message: prompt,
        user: UserId(42),
        emoji: emoji::RELAPSED.into(),
    })
    .await;
    assert_eq!(bot.tracker().streak_of(UserId(42)).unwrap().streak, 0);

    bot.handle_event(ChatEvent::ReactionRemoved {
        message: prompt,
        user: UserId(42),
        emoji: emoji::RELAPSED.into(),
    })
    .await;
    assert_eq!(bot.tracker().streak_of(UserId(42)).unwrap().streak, 0);
}

#[tokio::test]
async fn unknown_emoji_and_foreign_messages_are_ignored() {
    let mut bot = new_bot_with_members(&[42]);
    bot.post_daily_prompt().await;
    let prompt = bot.tracker().prompt().unwrap();

    bot.handle_event(ChatEvent::ReactionAdded {
        message: prompt,
        user: UserId(42),
        emoji: "\u{1f389}".into(),
    })
    .await;
    bot.handle_event(ChatEvent::ReactionAdded {
        message: MessageId(555),
        user: UserId(42),
        emoji: emoji::CLEAN.into(),
    })
    .await;

    assert_eq!(bot.tracker().streak_of(UserId(42)).unwrap().streak, 0);
    assert_eq!(count_events(&bot, EventKind::Checkin), 0);
}

#[tokio::test]
async fn reminder_mentions_only_pending_members() {
    let mut bot = new_bot_with_members(&[1, 2]);
    bot.post_daily_prompt().await;
    let prompt = bot.tracker().prompt().unwrap();

    bot.handle_event(ChatEvent::ReactionAdded {
        message: prompt,
        user: UserId(2),
        emoji: emoji::CLOSE.into(),
    })
    .await;

    bot.post_evening_reminder().await;
    let reminder = bot.gateway().last_sent();
    assert!(reminder.contains("<@1>"));
    assert!(!reminder.contains("<@2>"));
    assert_eq!(count_events(&bot, EventKind::ReminderSent), 1);
}

#[tokio::test]
async fn no_reminder_when_everyone_responded() {
    let mut bot = new_bot_with_members(&[1]);
    bot.post_daily_prompt().await;
    let prompt = bot.tracker().prompt().unwrap();

    bot.handle_event(ChatEvent::ReactionAdded {
        message: prompt,
        user: UserId(1),
        emoji: emoji::CLEAN.into(),
    })
    .await;

    let sent_before = bot.gateway().sent_count();
    bot.post_evening_reminder().await;
    assert_eq!(bot.gateway().sent_count(), sent_before);
    assert_eq!(count_events(&bot, EventKind::ReminderSent), 0);
}

#[tokio::test]
async fn streak_command_replies_with_counters() {
    let mut bot = new_bot_with_members(&[42]);
    bot.post_daily_prompt().await;
    let prompt = bot.tracker().prompt().unwrap();
    bot.handle_event(ChatEvent::ReactionAdded {
        message: prompt,
        user: UserId(42),
        emoji: emoji::CLEAN.into(),
    })
    .await;

    bot.handle_event(ChatEvent::Message {
        channel: ChannelId(CHANNEL),
        author: UserId(42),
        content: "!streak".into(),
    })
    .await;
    let reply = bot.gateway().last_sent();
    assert!(reply.contains("1 clean days"));
}

#[tokio::test]
async fn manual_trigger_requires_the_administrator_capability() {
    let mut bot = new_bot_with_members(&[42]);

    bot.handle_event(ChatEvent::Message {
        channel: ChannelId(CHANNEL),
        author: UserId(42),
        content: "!triggercheckin".into(),
    })
    .await;
    assert!(bot.tracker().prompt().is_none());
    assert!(bot.gateway().last_sent().contains("only an administrator"));

    bot.gateway().admin.set(true);
    bot.handle_event(ChatEvent::Message {
        channel: ChannelId(CHANNEL),
        author: UserId(42),
        content: "!triggercheckin".into(),
    })
    .await;
    assert!(bot.tracker().prompt().is_some());
    assert_eq!(count_events(&bot, EventKind::DailyCheckinSent), 1);
}

#[tokio::test]
async fn commands_outside_the_channel_are_ignored() {
    let mut bot = new_bot_with_members(&[42]);
    bot.handle_event(ChatEvent::Message {
        channel: ChannelId(999),
        author: UserId(42),
        content: "!streak".into(),
    })
    .await;
    assert_eq!(bot.gateway().sent_count(), 0);
}

#[tokio::test]
async fn second_reaction_of_the_day_is_dropped() {
    let mut bot = new_bot_with_members(&[42]);
    bot.post_daily_prompt().await;
    let prompt = bot.tracker().prompt().unwrap();

    bot.handle_event(ChatEvent::ReactionAdded {
        message: prompt,
        user: UserId(42),
        emoji: emoji::CLEAN.into(),
    })
    .await;
    bot.handle_event(ChatEvent::ReactionAdded {
        message: prompt,
        user: UserId(42),
        emoji: emoji::RELAPSED.into(),
    })
    .await;

    let record = bot.tracker().streak_of(UserId(42)).unwrap();
    assert_eq!(record.streak, 1);
    assert_eq!(count_events(&bot, EventKind::Checkin), 1);
}

#[tokio::test]
async fn new_prompt_discards_previous_responses() {
    let mut bot = new_bot_with_members(&[42]);
    bot.post_daily_prompt().await;
    let first = bot.tracker().prompt().unwrap();
    bot.handle_event(ChatEvent::ReactionAdded {
        message: first,
        user: UserId(42),
        emoji: emoji::CLEAN.into(),
    })
    .await;
    assert!(bot.tracker().pending().is_empty());

    bot.post_daily_prompt().await;
    let second = bot.tracker().prompt().unwrap();
    assert_ne!(first, second);
    assert_eq!(bot.tracker().pending(), vec![UserId(42)]);

    // Reactions to the replaced prompt no longer route anywhere.
    bot.handle_event(ChatEvent::ReactionRemoved {
        message: first,
        user: UserId(42),
        emoji: emoji::CLEAN.into(),
    })
    .await;
    assert_eq!(bot.tracker().streak_of(UserId(42)).unwrap().streak, 1);
}

#[tokio::test]
async fn non_members_cannot_check_in() {
    let mut bot = new_bot();
    bot.post_daily_prompt().await;
    let prompt = bot.tracker().prompt().unwrap();

    bot.handle_event(ChatEvent::ReactionAdded {
        message: prompt,
        user: UserId(7),
        emoji: emoji::CLEAN.into(),
    })
    .await;
    assert_eq!(
        bot.tracker().streak_of(UserId(7)).unwrap(),
        StreakRecord::default()
    );
    assert_eq!(count_events(&bot, EventKind::Checkin), 0);
}
