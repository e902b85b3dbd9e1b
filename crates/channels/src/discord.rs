//! Discord channel adapter (stub).
//!
//! Implements the Channel trait for the Discord Bot API.
//! In production, this would use `serenity` for the WebSocket gateway.
//! Currently a stub with in-process message injection for testing.

use async_trait::async_trait;
use guildmind_core::channel::{Channel, ChannelId, ChannelMessage};
use guildmind_core::error::ChannelError;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Discord channel configuration.
#[derive(Clone)]
pub struct DiscordConfig {
    /// Bot token from the Discord Developer Portal.
    pub bot_token: String,
    /// Guild (server) IDs to listen in. Empty = all guilds.
    pub guild_filter: Vec<i64>,
    /// Chat (text channel) IDs to listen in. Empty = all chats.
    pub chat_filter: Vec<String>,
}

impl std::fmt::Debug for DiscordConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordConfig")
            .field("bot_token", &"[REDACTED]")
            .field("guild_filter", &self.guild_filter)
            .field("chat_filter", &self.chat_filter)
            .finish()
    }
}

/// Discord channel adapter.
pub struct DiscordChannel {
    config: DiscordConfig,
    channel_id: ChannelId,
    inject_tx: tokio::sync::Mutex<Option<mpsc::Sender<Result<ChannelMessage, ChannelError>>>>,
}

impl DiscordChannel {
    pub fn new(config: DiscordConfig) -> Self {
        Self {
            config,
            channel_id: ChannelId("discord".into()),
            inject_tx: tokio::sync::Mutex::new(None),
        }
    }

    /// Whether a message passes the configured guild and chat filters.
    pub fn qualifies(&self, msg: &ChannelMessage) -> bool {
        if !self.config.guild_filter.is_empty()
            && !self.config.guild_filter.contains(&msg.scope_id.0)
        {
            return false;
        }
        if !self.config.chat_filter.is_empty()
            && !self.config.chat_filter.iter().any(|c| c == &msg.chat_id)
        {
            return false;
        }
        true
    }

    /// Inject a message as if it came from Discord (for testing).
    ///
    /// Messages failing the guild/chat filters are dropped here, the same
    /// place the gateway event handler would drop them.
    pub async fn inject_message(&self, msg: ChannelMessage) -> Result<(), ChannelError> {
        if !self.qualifies(&msg) {
            debug!(scope = %msg.scope_id, chat_id = %msg.chat_id, "Message filtered out");
            return Ok(());
        }
        let guard = self.inject_tx.lock().await;
        if let Some(tx) = guard.as_ref() {
            tx.send(Ok(msg))
                .await
                .map_err(|_| ChannelError::ConnectionLost("Message channel closed".into()))
        } else {
            Err(ChannelError::ConnectionLost("Channel not started".into()))
        }
    }
}

#[async_trait]
impl Channel for DiscordChannel {
    fn name(&self) -> &str {
        "discord"
    }

    fn id(&self) -> &ChannelId {
        &self.channel_id
    }

    async fn start(
        &self,
    ) -> Result<mpsc::Receiver<Result<ChannelMessage, ChannelError>>, ChannelError> {
        if self.config.bot_token.is_empty() {
            return Err(ChannelError::NotConfigured("Discord bot token is empty".into()));
        }
        info!("Discord channel starting (stub mode)");
        let (tx, rx) = mpsc::channel(64);
        *self.inject_tx.lock().await = Some(tx);
        Ok(rx)
    }

    async fn send(
        &self,
        chat_id: &str,
        content: &str,
        reply_to: Option<&str>,
    ) -> Result<(), ChannelError> {
        info!(
            chat_id = %chat_id,
            reply_to = ?reply_to,
            content_len = content.len(),
            "Discord send (stub)"
        );
        Ok(())
    }

    async fn stop(&self) -> Result<(), ChannelError> {
        info!("Discord channel stopping");
        *self.inject_tx.lock().await = None;
        Ok(())
    }

    async fn health_check(&self) -> Result<bool, ChannelError> {
        Ok(!self.config.bot_token.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guildmind_core::turn::ScopeId;

    fn test_config() -> DiscordConfig {
        DiscordConfig {
            bot_token: "test-discord-token".into(),
            guild_filter: vec![],
            chat_filter: vec![],
        }
    }

    fn test_message(scope: i64, chat_id: &str) -> ChannelMessage {
        ChannelMessage {
            channel_id: ChannelId("discord".into()),
            scope_id: ScopeId(scope),
            chat_id: chat_id.into(),
            sender_id: "user456".into(),
            sender_name: Some("Bob".into()),
            content: "Hey from Discord!".into(),
            message_id: Some("m1".into()),
            is_self: false,
        }
    }

    #[test]
    fn channel_name_and_id() {
        let ch = DiscordChannel::new(test_config());
        assert_eq!(ch.name(), "discord");
        assert_eq!(ch.id().0, "discord");
    }

    #[test]
    fn redacts_token_in_debug() {
        let debug = format!("{:?}", test_config());
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("test-discord-token"));
    }

    #[test]
    fn empty_filters_accept_everything() {
        let ch = DiscordChannel::new(test_config());
        assert!(ch.qualifies(&test_message(1, "anywhere")));
    }

    #[test]
    fn guild_filter_applies() {
        let ch = DiscordChannel::new(DiscordConfig {
            guild_filter: vec![42],
            ..test_config()
        });
        assert!(ch.qualifies(&test_message(42, "general")));
        assert!(!ch.qualifies(&test_message(43, "general")));
    }

    #[test]
    fn chat_filter_applies() {
        let ch = DiscordChannel::new(DiscordConfig {
            chat_filter: vec!["general".into()],
            ..test_config()
        });
        assert!(ch.qualifies(&test_message(1, "general")));
        assert!(!ch.qualifies(&test_message(1, "random")));
    }

    #[tokio::test]
    async fn start_inject_and_receive() {
        let ch = DiscordChannel::new(test_config());
        let mut rx = ch.start().await.unwrap();

        ch.inject_message(test_message(1, "general")).await.unwrap();
        let received = rx.recv().await.unwrap().unwrap();
        assert_eq!(received.content, "Hey from Discord!");
    }

    #[tokio::test]
    async fn filtered_message_is_dropped_silently() {
        let ch = DiscordChannel::new(DiscordConfig {
            guild_filter: vec![42],
            ..test_config()
        });
        let mut rx = ch.start().await.unwrap();

        ch.inject_message(test_message(7, "general")).await.unwrap();
        ch.inject_message(test_message(42, "general")).await.unwrap();

        let received = rx.recv().await.unwrap().unwrap();
        assert_eq!(received.scope_id, ScopeId(42));
    }

    #[tokio::test]
    async fn inject_before_start_fails() {
        let ch = DiscordChannel::new(test_config());
        assert!(ch.inject_message(test_message(1, "general")).await.is_err());
    }

    #[tokio::test]
    async fn empty_token_refuses_to_start() {
        let ch = DiscordChannel::new(DiscordConfig {
            bot_token: String::new(),
            ..test_config()
        });
        assert!(ch.start().await.is_err());
        assert!(!ch.health_check().await.unwrap());
    }
}
