//! Channel trait — the abstraction over chat platforms.
//!
//! A Channel connects guildmind to a messaging platform. It delivers incoming
//! message events and accepts outgoing sends; everything else about the
//! platform (socket handshakes, command registration) stays behind it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ChannelError;
use crate::turn::ScopeId;

/// Unique identifier for a channel instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelId(pub String);

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A message received from a channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelMessage {
    /// The channel this message belongs to
    pub channel_id: ChannelId,

    /// The conversation scope (guild) this message arrived in
    pub scope_id: ScopeId,

    /// The chat/room identifier within the channel
    pub chat_id: String,

    /// Sender identifier (platform-specific user ID)
    pub sender_id: String,

    /// Human-readable sender name (if available)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_name: Option<String>,

    /// The text content
    pub content: String,

    /// Platform message ID, for reply threading
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,

    /// Whether the bot itself sent this message
    #[serde(default)]
    pub is_self: bool,
}

/// The core Channel trait.
///
/// Implementations handle platform-specific connection logic and formatting.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Human-readable channel name (e.g., "discord").
    fn name(&self) -> &str;

    /// Unique ID for this channel instance.
    fn id(&self) -> &ChannelId;

    /// Start listening for incoming messages.
    ///
    /// Returns a receiver that yields incoming messages in arrival order.
    async fn start(
        &self,
    ) -> std::result::Result<
        tokio::sync::mpsc::Receiver<std::result::Result<ChannelMessage, ChannelError>>,
        ChannelError,
    >;

    /// Send a message to a specific chat, optionally as a reply.
    async fn send(
        &self,
        chat_id: &str,
        content: &str,
        reply_to: Option<&str>,
    ) -> std::result::Result<(), ChannelError>;

    /// Stop the channel gracefully.
    async fn stop(&self) -> std::result::Result<(), ChannelError> {
        Ok(())
    }

    /// Health check — is the channel connected and operational?
    async fn health_check(&self) -> std::result::Result<bool, ChannelError> {
        Ok(true)
    }
}
