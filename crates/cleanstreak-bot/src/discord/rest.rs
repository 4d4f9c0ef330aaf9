//! Discord REST client implementing the chat gateway.

use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use cleanstreak_core::{MessageId, UserId};

use crate::gateway::{ChannelId, ChatGateway, GatewayError, GuildId};

const API_BASE: &str = "https://discord.com/api/v10";
const ADMINISTRATOR: u64 = 1 << 3;

pub struct DiscordRest {
    http: Client,
    token: String,
    guild: Option<GuildId>,
}

impl DiscordRest {
    /// A client for one bot token. `guild` is required for the
    /// administrator check; without it the check denies everyone.
    pub fn new(token: String, guild: Option<GuildId>) -> Self {
        Self {
            http: Client::new(),
            token,
            guild,
        }
    }

    fn auth(&self) -> String {
        format!("Bot {}", self.token)
    }

    async fn checked(response: reqwest::Response) -> Result<reqwest::Response, GatewayError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(GatewayError::Delivery {
                status: status.as_u16(),
                body,
            })
        }
    }

    async fn get_json(&self, url: &str) -> Result<Value, GatewayError> {
        let response = self
            .http
            .get(url)
            .header("Authorization", self.auth())
            .send()
            .await?;
        Ok(Self::checked(response).await?.json().await?)
    }

    async fn fetch_display_name(&self, user: UserId) -> Result<String, GatewayError> {
        let body = self.get_json(&format!("{API_BASE}/users/{user}")).await?;
        body["global_name"]
            .as_str()
            .or_else(|| body["username"].as_str())
            .map(str::to_string)
            .ok_or_else(|| GatewayError::Malformed("user object without a name".into()))
    }
}

impl ChatGateway for DiscordRest {
    async fn send_message(
        &self,
        channel: ChannelId,
        text: &str,
    ) -> Result<MessageId, GatewayError> {
        let response = self
            .http
            .post(format!("{API_BASE}/channels/{channel}/messages"))
            .header("Authorization", self.auth())
            .json(&json!({ "content": text }))
            .send()
            .await?;
        let body: Value = Self::checked(response).await?.json().await?;
        snowflake(&body["id"])
            .map(MessageId)
            .ok_or_else(|| GatewayError::Malformed("message object without an id".into()))
    }

    async fn edit_message(
        &self,
        channel: ChannelId,
        message: MessageId,
        text: &str,
    ) -> Result<(), GatewayError> {
        let response = self
            .http
            .patch(format!("{API_BASE}/channels/{channel}/messages/{message}"))
            .header("Authorization", self.auth())
            .json(&json!({ "content": text }))
            .send()
            .await?;
        Self::checked(response).await?;
        Ok(())
    }

    async fn add_reaction(
        &self,
        channel: ChannelId,
        message: MessageId,
        emoji: &str,
    ) -> Result<(), GatewayError> {
        let response = self
            .http
            .put(format!(
                "{API_BASE}/channels/{channel}/messages/{message}/reactions/{}/@me",
                urlencoding::encode(emoji)
            ))
            .header("Authorization", self.auth())
            .send()
            .await?;
        Self::checked(response).await?;
        Ok(())
    }

    async fn display_name(&self, user: UserId) -> String {
        match self.fetch_display_name(user).await {
            Ok(name) => name,
            Err(e) => {
                debug!(%user, "display name lookup failed: {e}");
                format!("User({user})")
            }
        }
    }

    async fn is_administrator(&self, user: UserId) -> Result<bool, GatewayError> {
        let Some(guild) = self.guild else {
            return Ok(false);
        };

        let guild_object = self.get_json(&format!("{API_BASE}/guilds/{guild}")).await?;
        if snowflake(&guild_object["owner_id"]) == Some(user.0) {
            return Ok(true);
        }

        let member = self
            .get_json(&format!("{API_BASE}/guilds/{guild}/members/{user}"))
            .await?;
        let held: Vec<&str> = member["roles"]
            .as_array()
            .map(|roles| roles.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        let roles = self
            .get_json(&format!("{API_BASE}/guilds/{guild}/roles"))
            .await?;
        let granted = roles
            .as_array()
            .map(|roles| {
                roles.iter().any(|role| {
                    role["id"]
                        .as_str()
                        .is_some_and(|id| held.contains(&id))
                        && role["permissions"]
                            .as_str()
                            .and_then(|bits| bits.parse::<u64>().ok())
                            .is_some_and(|bits| bits & ADMINISTRATOR != 0)
                })
            })
            .unwrap_or(false);
        Ok(granted)
    }
}

fn snowflake(value: &Value) -> Option<u64> {
    value.as_str().and_then(|s| s.parse().ok())
}
