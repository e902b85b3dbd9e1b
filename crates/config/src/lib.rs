//! Configuration loading, validation, and management for guildmind.
//!
//! Loads configuration from `~/.guildmind/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use guildmind_core::persona::Persona;

/// The root configuration structure.
///
/// Maps directly to `~/.guildmind/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Provider API key (usually set via `OPENAI_API_KEY` instead)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Completion endpoint base URL
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Default model
    #[serde(default = "default_model")]
    pub model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens per provider response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Retry behavior for completion calls
    #[serde(default)]
    pub retry: RetryConfig,

    /// Context store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Session cache configuration
    #[serde(default)]
    pub cache: CacheConfig,

    /// Context window configuration
    #[serde(default)]
    pub context: ContextConfig,

    /// Persona configuration
    #[serde(default)]
    pub persona: PersonaConfig,

    /// Discord channel configuration
    #[serde(default)]
    pub discord: DiscordConfig,

    /// Web search configuration
    #[serde(default)]
    pub search: SearchConfig,
}

fn default_api_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    1.0
}
fn default_max_tokens() -> u32 {
    2000
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("retry", &self.retry)
            .field("store", &self.store)
            .field("cache", &self.cache)
            .field("context", &self.context)
            .field("persona", &self.persona)
            .field("discord", &self.discord)
            .field("search", &self.search)
            .finish()
    }
}

/// Retry behavior for completion calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum completion attempts per message
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base wait in seconds; attempt `n` waits `n * base_delay_secs`
    #[serde(default = "default_base_delay_secs")]
    pub base_delay_secs: u64,

    /// Overall deadline for one attempt, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_max_retries() -> u32 {
    3
}
fn default_base_delay_secs() -> u64 {
    5
}
fn default_request_timeout_secs() -> u64 {
    120
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_secs: default_base_delay_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Context store configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// "postgres" or "memory"
    #[serde(default = "default_store_backend")]
    pub backend: String,

    /// Connection string (usually set via `DATABASE_URL` instead)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,
}

fn default_store_backend() -> String {
    "postgres".into()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            database_url: None,
        }
    }
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("backend", &self.backend)
            .field("database_url", &redact(&self.database_url))
            .finish()
    }
}

/// Session cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// How long a cached Q/A pair stays answerable, in hours
    #[serde(default = "default_qa_ttl_hours")]
    pub qa_ttl_hours: i64,
}

fn default_qa_ttl_hours() -> i64 {
    24
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            qa_ttl_hours: default_qa_ttl_hours(),
        }
    }
}

/// Context window configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// How many recent turns feed each prompt
    #[serde(default = "default_window_size")]
    pub window_size: usize,
}

fn default_window_size() -> usize {
    6
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
        }
    }
}

/// Persona configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaConfig {
    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Override the system prompt entirely
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,

    /// Override the fallback lines (empty = built-in set)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fallback_lines: Vec<String>,
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            name: None,
            system_prompt: None,
            fallback_lines: vec![],
        }
    }
}

impl PersonaConfig {
    /// Build the runtime persona, falling back to built-in defaults per field.
    pub fn to_persona(&self) -> Persona {
        let mut persona = Persona::default();
        if let Some(name) = &self.name {
            persona.name = name.clone();
        }
        if let Some(prompt) = &self.system_prompt {
            persona.system_prompt = prompt.clone();
        }
        if !self.fallback_lines.is_empty() {
            persona.fallback_lines = self.fallback_lines.clone();
        }
        persona
    }
}

/// Discord channel configuration.
#[derive(Clone, Serialize, Deserialize, Default)]
pub struct DiscordConfig {
    /// Bot token (usually set via `DISCORD_BOT_TOKEN` instead)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_token: Option<String>,

    /// Only respond in this chat, if set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listen_chat_id: Option<String>,

    /// Where operational alerts go, if set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ops_chat_id: Option<String>,

    /// Guild IDs to listen in. Empty = all guilds.
    #[serde(default)]
    pub guild_filter: Vec<i64>,

    /// Chat IDs to listen in. Empty = all chats.
    #[serde(default)]
    pub chat_filter: Vec<String>,
}

impl std::fmt::Debug for DiscordConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordConfig")
            .field("bot_token", &redact(&self.bot_token))
            .field("listen_chat_id", &self.listen_chat_id)
            .field("ops_chat_id", &self.ops_chat_id)
            .field("guild_filter", &self.guild_filter)
            .field("chat_filter", &self.chat_filter)
            .finish()
    }
}

/// Web search configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Search API endpoint
    #[serde(default = "default_search_url")]
    pub api_url: String,

    /// Search API key (usually set via `BING_API_KEY` instead)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Results returned per query
    #[serde(default = "default_search_results")]
    pub max_results: usize,
}

fn default_search_url() -> String {
    "https://api.bing.microsoft.com/v7.0/search".into()
}
fn default_search_results() -> usize {
    5
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_url: default_search_url(),
            api_key: None,
            max_results: default_search_results(),
        }
    }
}

impl std::fmt::Debug for SearchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &redact(&self.api_key))
            .field("max_results", &self.max_results)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.guildmind/config.toml).
    ///
    /// Environment variables take priority over the file:
    /// - `GUILDMIND_API_KEY` then `OPENAI_API_KEY` for the provider key
    /// - `GUILDMIND_MODEL` for the model
    /// - `DATABASE_URL` for the context store
    /// - `DISCORD_BOT_TOKEN` for the channel
    /// - `BING_API_KEY` for web search
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if config.api_key.is_none() {
            config.api_key = std::env::var("GUILDMIND_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(model) = std::env::var("GUILDMIND_MODEL") {
            config.model = model;
        }

        if config.store.database_url.is_none() {
            config.store.database_url = std::env::var("DATABASE_URL").ok();
        }

        if config.discord.bot_token.is_none() {
            config.discord.bot_token = std::env::var("DISCORD_BOT_TOKEN").ok();
        }

        if config.search.api_key.is_none() {
            config.search.api_key = std::env::var("BING_API_KEY").ok();
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".guildmind")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.temperature < 0.0 || self.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.retry.max_retries == 0 {
            return Err(ConfigError::ValidationError(
                "retry.max_retries must be at least 1".into(),
            ));
        }

        if self.context.window_size == 0 {
            return Err(ConfigError::ValidationError(
                "context.window_size must be at least 1".into(),
            ));
        }

        if self.cache.qa_ttl_hours <= 0 {
            return Err(ConfigError::ValidationError(
                "cache.qa_ttl_hours must be positive".into(),
            ));
        }

        match self.store.backend.as_str() {
            "postgres" | "memory" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "unknown store backend: {other} (expected \"postgres\" or \"memory\")"
                )));
            }
        }

        Ok(())
    }

    /// Check if a provider API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string (for first-run setup).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_api_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            retry: RetryConfig::default(),
            store: StoreConfig::default(),
            cache: CacheConfig::default(),
            context: ContextConfig::default(),
            persona: PersonaConfig::default(),
            discord: DiscordConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.retry.base_delay_secs, 5);
        assert_eq!(config.context.window_size, 6);
        assert_eq!(config.cache.qa_ttl_hours, 24);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.model, config.model);
        assert_eq!(parsed.retry.max_retries, config.retry.max_retries);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            temperature: 5.0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_retries_rejected() {
        let config = AppConfig {
            retry: RetryConfig {
                max_retries: 0,
                ..RetryConfig::default()
            },
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_store_backend_rejected() {
        let config = AppConfig {
            store: StoreConfig {
                backend: "redis".into(),
                database_url: None,
            },
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        assert_eq!(result.unwrap().model, "gpt-4o-mini");
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
model = "gpt-4o"
temperature = 0.5

[retry]
max_retries = 5

[discord]
listen_chat_id = "123456"
ops_chat_id = "789"
guild_filter = [42]

[persona]
system_prompt = "You are a pirate."
"#
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.retry.max_retries, 5);
        assert_eq!(config.retry.base_delay_secs, 5);
        assert_eq!(config.discord.listen_chat_id.as_deref(), Some("123456"));
        assert_eq!(config.discord.guild_filter, vec![42]);
        assert_eq!(
            config.persona.to_persona().system_prompt,
            "You are a pirate."
        );
    }

    #[test]
    fn secrets_redacted_in_debug() {
        let config = AppConfig {
            api_key: Some("sk-secret".into()),
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("sk-secret"));
    }

    #[test]
    fn persona_overrides_apply_per_field() {
        let persona = PersonaConfig {
            name: Some("Cap".into()),
            system_prompt: None,
            fallback_lines: vec![],
        }
        .to_persona();
        assert_eq!(persona.name, "Cap");
        assert!(!persona.system_prompt.is_empty());
        assert!(!persona.fallback_lines.is_empty());
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("gpt-4o-mini"));
        assert!(toml_str.contains("max_retries"));
    }
}
