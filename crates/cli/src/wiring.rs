//! Composition root — builds the runtime object graph from configuration.
//!
//! Every command that needs live collaborators goes through here, so the
//! provider, stores, channel, and orchestrator are always wired the same way.

use std::sync::Arc;
use std::time::Duration;

use guildmind_channels::DiscordChannel;
use guildmind_config::AppConfig;
use guildmind_core::event::EventBus;
use guildmind_core::provider::CompletionProvider;
use guildmind_core::store::ContextStore;
use guildmind_orchestrator::Orchestrator;
use guildmind_providers::{OpenAiCompatProvider, QuotaGuard, RetryPolicy, RetryingClient};
use guildmind_store::{InMemoryContextStore, PostgresContextStore, TtlCache};
use tracing::info;

/// The wired runtime: everything a command needs, ready to go.
pub struct Runtime {
    pub config: AppConfig,
    pub store: Arc<dyn ContextStore>,
    pub events: Arc<EventBus>,
    pub channel: Arc<DiscordChannel>,
    pub orchestrator: Arc<Orchestrator>,
}

/// Load config and build the full runtime.
pub async fn build() -> Result<Runtime, Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    build_from(config).await
}

/// Build the runtime from an already-loaded config.
pub async fn build_from(config: AppConfig) -> Result<Runtime, Box<dyn std::error::Error>> {
    let Some(api_key) = config.api_key.clone() else {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set the OPENAI_API_KEY environment variable, or add api_key to:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    };

    let provider: Arc<dyn CompletionProvider> =
        Arc::new(OpenAiCompatProvider::new("openai", &config.api_url, api_key)?);

    let events = Arc::new(EventBus::default());
    let guard = QuotaGuard::new(provider.clone(), events.clone());
    let policy = RetryPolicy {
        max_retries: config.retry.max_retries,
        base_delay: Duration::from_secs(config.retry.base_delay_secs),
        request_timeout: Duration::from_secs(config.retry.request_timeout_secs),
    };
    let client = RetryingClient::new(provider, guard, policy);

    let store: Arc<dyn ContextStore> = match config.store.backend.as_str() {
        "memory" => {
            info!("Using in-memory context store (conversations are not persisted)");
            Arc::new(InMemoryContextStore::new())
        }
        _ => {
            let url = config.store.database_url.clone().ok_or(
                "No database_url configured. Set DATABASE_URL or use store.backend = \"memory\".",
            )?;
            let store = PostgresContextStore::connect(&url).await?;
            store.migrate().await?;
            info!("Connected to PostgreSQL context store");
            Arc::new(store)
        }
    };

    let cache = Arc::new(TtlCache::new());

    let channel = Arc::new(DiscordChannel::new(guildmind_channels::DiscordConfig {
        bot_token: config.discord.bot_token.clone().unwrap_or_default(),
        guild_filter: config.discord.guild_filter.clone(),
        chat_filter: config.discord.chat_filter.clone(),
    }));

    let mut orchestrator = Orchestrator::new(
        store.clone(),
        cache,
        client,
        channel.clone(),
        events.clone(),
    )
    .with_model(&config.model)
    .with_temperature(config.temperature)
    .with_max_tokens(config.max_tokens)
    .with_window_size(config.context.window_size)
    .with_qa_ttl(chrono::Duration::hours(config.cache.qa_ttl_hours))
    .with_persona(config.persona.to_persona());

    if let Some(chat) = &config.discord.listen_chat_id {
        orchestrator = orchestrator.with_listen_chat(chat);
    }

    Ok(Runtime {
        config,
        store,
        events,
        channel,
        orchestrator: Arc::new(orchestrator),
    })
}
