//! Discord gateway socket reader.
//!
//! Connects, identifies with the reaction and message-content intents,
//! heartbeats at the server-advertised interval, and translates dispatches
//! into [`ChatEvent`]s. Events from the bot's own user are dropped here so
//! nothing downstream has to re-check. Any disconnect tears the session
//! down and redials with a fresh identify.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::time::Interval;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{info, warn};

use cleanstreak_core::{MessageId, UserId};

use crate::gateway::{ChannelId, ChatEvent};

const GATEWAY_URL: &str = "wss://gateway.discord.gg/?v=10&encoding=json";
/// GUILD_MESSAGES | GUILD_MESSAGE_REACTIONS | MESSAGE_CONTENT
const INTENTS: u64 = (1 << 9) | (1 << 10) | (1 << 15);
const RECONNECT_DELAY: Duration = Duration::from_secs(5);
/// Used until HELLO announces the real interval.
const FALLBACK_HEARTBEAT_MS: u64 = 41_250;

/// Run the socket until the event channel closes, redialing after any
/// disconnect.
pub async fn run(token: String, events: mpsc::Sender<ChatEvent>) {
    loop {
        if let Err(e) = session(&token, &events).await {
            warn!("gateway session ended: {e}");
        }
        if events.is_closed() {
            return;
        }
        tokio::time::sleep(RECONNECT_DELAY).await;
        info!("reconnecting to gateway");
    }
}

async fn session(token: &str, events: &mpsc::Sender<ChatEvent>) -> anyhow::Result<()> {
    let (socket, _) = connect_async(GATEWAY_URL).await?;
    let (mut sink, mut stream) = socket.split();

    let mut heartbeat: Option<Interval> = None;
    let mut last_seq: Option<u64> = None;
    let mut bot_user: Option<UserId> = None;

    loop {
        tokio::select! {
            _ = beat(heartbeat.as_mut()) => {
                sink.send(Message::text(json!({"op": 1, "d": last_seq}).to_string()))
                    .await?;
            }
            message = stream.next() => {
                let Some(message) = message else {
                    anyhow::bail!("stream closed");
                };
                let message = message?;
                if message.is_close() {
                    anyhow::bail!("server closed the connection");
                }
                if !message.is_text() {
                    continue;
                }
                let payload: Value = serde_json::from_str(message.to_text()?)?;
                match payload["op"].as_u64() {
                    // HELLO: start heartbeating, then identify.
                    Some(10) => {
                        let interval_ms = payload["d"]["heartbeat_interval"]
                            .as_u64()
                            .unwrap_or(FALLBACK_HEARTBEAT_MS);
                        heartbeat =
                            Some(tokio::time::interval(Duration::from_millis(interval_ms)));
                        sink.send(Message::text(identify(token).to_string())).await?;
                    }
                    // Immediate heartbeat request.
                    Some(1) => {
                        sink.send(Message::text(
                            json!({"op": 1, "d": last_seq}).to_string(),
                        ))
                        .await?;
                    }
                    // Dispatch.
                    Some(0) => {
                        if let Some(seq) = payload["s"].as_u64() {
                            last_seq = Some(seq);
                        }
                        if let Some(event) = translate(&payload, &mut bot_user) {
                            if events.send(event).await.is_err() {
                                // Receiver gone; the process is shutting down.
                                return Ok(());
                            }
                        }
                    }
                    // Reconnect / invalid session: redial with a fresh identify.
                    Some(7) | Some(9) => anyhow::bail!("server requested reconnect"),
                    _ => {}
                }
            }
        }
    }
}

async fn beat(interval: Option<&mut Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

fn identify(token: &str) -> Value {
    json!({
        "op": 2,
        "d": {
            "token": token,
            "intents": INTENTS,
            "properties": {
                "os": std::env::consts::OS,
                "browser": "cleanstreak",
                "device": "cleanstreak"
            }
        }
    })
}

fn translate(payload: &Value, bot_user: &mut Option<UserId>) -> Option<ChatEvent> {
    let data = &payload["d"];
    match payload["t"].as_str()? {
        "READY" => {
            let user = UserId(snowflake(&data["user"]["id"])?);
            *bot_user = Some(user);
            Some(ChatEvent::Ready { bot_user: user })
        }
        "MESSAGE_CREATE" => {
            if data["author"]["bot"].as_bool().unwrap_or(false) {
                return None;
            }
            let author = UserId(snowflake(&data["author"]["id"])?);
            if *bot_user == Some(author) {
                return None;
            }
            Some(ChatEvent::Message {
                channel: ChannelId(snowflake(&data["channel_id"])?),
                author,
                content: data["content"].as_str().unwrap_or_default().to_string(),
            })
        }
        kind @ ("MESSAGE_REACTION_ADD" | "MESSAGE_REACTION_REMOVE") => {
            let user = UserId(snowflake(&data["user_id"])?);
            if *bot_user == Some(user) {
                return None;
            }
            let message = MessageId(snowflake(&data["message_id"])?);
            let emoji = data["emoji"]["name"].as_str().unwrap_or_default().to_string();
            Some(if kind == "MESSAGE_REACTION_ADD" {
                ChatEvent::ReactionAdded {
                    message,
                    user,
                    emoji,
                }
            } else {
                ChatEvent::ReactionRemoved {
                    message,
                    user,
                    emoji,
                }
            })
        }
        _ => None,
    }
}

fn snowflake(value: &Value) -> Option<u64> {
    value.as_str().and_then(|s| s.parse().ok())
}
