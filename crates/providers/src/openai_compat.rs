//! OpenAI-compatible provider implementation.
//!
//! Works with: OpenAI, OpenRouter, Ollama, vLLM, and any endpoint exposing
//! an OpenAI-compatible `/v1/chat/completions` surface.
//!
//! Status mapping: 429 → `RateLimited`, 401/403 → `Unauthorized`, any other
//! non-200 → `Api`. The retry policy upstream only ever retries the first.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use guildmind_core::error::ProviderError;
use guildmind_core::provider::*;

/// An OpenAI-compatible completion provider.
pub struct OpenAiCompatProvider {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Create a new OpenAI-compatible provider.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {e}")))?;

        Ok(Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        })
    }

    /// Create an OpenAI provider (convenience constructor).
    pub fn openai(api_key: impl Into<String>) -> Result<Self, ProviderError> {
        Self::new("openai", "https://api.openai.com/v1", api_key)
    }

    /// Create an Ollama provider (convenience constructor).
    pub fn ollama(base_url: Option<&str>) -> Result<Self, ProviderError> {
        Self::new(
            "ollama",
            base_url.unwrap_or("http://localhost:11434/v1"),
            "ollama", // Ollama doesn't need a real key
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn classify_status(status: u16) -> Option<ProviderError> {
        match status {
            200 => None,
            429 => Some(ProviderError::RateLimited { retry_after_secs: 5 }),
            401 | 403 => Some(ProviderError::Unauthorized(
                "Invalid API key or insufficient permissions".into(),
            )),
            other => Some(ProviderError::Api {
                status_code: other,
                message: String::new(),
            }),
        }
    }
}

#[async_trait]
impl CompletionProvider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<CompletionResponse, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut body = serde_json::json!({
            "model": request.model,
            "messages": request.messages,
            "temperature": request.temperature,
        });

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        debug!(provider = %self.name, model = %request.model, "Sending completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if let Some(mut err) = Self::classify_status(status) {
            if let ProviderError::Api { message, .. } = &mut err {
                *message = response.text().await.unwrap_or_default();
                warn!(status, body = %message, "Provider returned error");
            }
            return Err(err);
        }

        let api_response: ApiResponse =
            response.json().await.map_err(|e| ProviderError::Api {
                status_code: 200,
                message: format!("Failed to parse response: {e}"),
            })?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::Api {
                status_code: 200,
                message: "No choices in response".into(),
            })?;

        let usage = api_response.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(CompletionResponse {
            text: choice.message.content.unwrap_or_default().trim().to_string(),
            model: api_response.model,
            usage,
        })
    }

    async fn list_models(&self) -> std::result::Result<Vec<String>, ProviderError> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if let Some(mut err) = Self::classify_status(status) {
            if let ProviderError::Api { message, .. } = &mut err {
                *message = response.text().await.unwrap_or_default();
            }
            return Err(err);
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let models = body["data"]
            .as_array()
            .map(|arr| {
                arr.iter()
                    .filter_map(|m| m["id"].as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default();

        Ok(models)
    }
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Deserialize)]
struct ApiResponse {
    model: String,
    choices: Vec<ApiChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    #[allow(dead_code)]
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}
