//! CompletionProvider trait — the abstraction over LLM backends.
//!
//! A provider knows how to send a conversation to a completion endpoint and
//! get text back. Implementations: OpenAI-compatible endpoints, plus the
//! retrying wrapper in `guildmind-providers`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::turn::{Speaker, Turn};

/// The role of a prompt message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One message in the prompt sent to the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

impl From<&Turn> for ChatMessage {
    fn from(turn: &Turn) -> Self {
        match turn.speaker {
            Speaker::User => ChatMessage::user(&turn.text),
            Speaker::Assistant => ChatMessage::assistant(&turn.text),
        }
    }
}

/// Configuration for one completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// The model to use (e.g., "gpt-4o-mini")
    pub model: String,

    /// The prompt messages, system-first
    pub messages: Vec<ChatMessage>,

    /// Temperature (0.0 = deterministic, 2.0 = chaotic)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

fn default_temperature() -> f32 {
    1.0
}

/// A complete response from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// The generated text
    pub text: String,

    /// Which model actually responded (may differ from requested)
    pub model: String,

    /// Token usage statistics
    pub usage: Option<Usage>,
}

/// Token usage information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// The core CompletionProvider trait.
///
/// The orchestrator calls `complete()` without knowing which backend is in
/// use. `list_models()` doubles as the Quota Guard's pre-flight probe.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// A human-readable name for this provider (e.g., "openai").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<CompletionResponse, ProviderError>;

    /// List available models. Cheap relative to a completion, so it serves
    /// as the availability probe.
    async fn list_models(&self) -> std::result::Result<Vec<String>, ProviderError>;

    /// Health check — can we reach the provider?
    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        Ok(self.list_models().await.is_ok())
    }
}
