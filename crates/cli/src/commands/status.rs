//! `guildmind status` — Show effective configuration and provider health.

use guildmind_config::AppConfig;
use guildmind_core::provider::CompletionProvider;
use guildmind_providers::OpenAiCompatProvider;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    println!("Guildmind Status");
    println!("================");
    println!("  Config dir:  {}", AppConfig::config_dir().display());
    println!("  Model:       {}", config.model);
    println!("  Temperature: {}", config.temperature);
    println!("  Max tokens:  {}", config.max_tokens);
    println!("  Store:       {}", config.store.backend);
    println!("  Window:      {} turns", config.context.window_size);
    println!("  Cache TTL:   {}h", config.cache.qa_ttl_hours);
    println!(
        "  Retry:       {} attempts, {}s base delay",
        config.retry.max_retries, config.retry.base_delay_secs
    );
    println!(
        "  Listen chat: {}",
        config.discord.listen_chat_id.as_deref().unwrap_or("all")
    );
    println!(
        "  Ops chat:    {}",
        config.discord.ops_chat_id.as_deref().unwrap_or("none")
    );
    println!(
        "  API key:     {}",
        if config.has_api_key() { "configured" } else { "missing" }
    );
    println!(
        "  Bot token:   {}",
        if config.discord.bot_token.is_some() { "configured" } else { "missing" }
    );

    if let Some(api_key) = &config.api_key {
        let provider = OpenAiCompatProvider::new("openai", &config.api_url, api_key.clone())?;
        print!("  Provider:    ");
        match provider.health_check().await {
            Ok(true) => println!("reachable"),
            Ok(false) => println!("unreachable"),
            Err(e) => println!("error ({e})"),
        }
    }

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("\n  Config file found");
    } else {
        println!("\n  No config file, running on defaults and environment variables");
    }

    Ok(())
}
