//! `guildmind search` — Run a web search and print the results.

use guildmind_config::AppConfig;
use guildmind_providers::WebSearchClient;

pub async fn run(query: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    let Some(api_key) = config.search.api_key else {
        return Err("No search API key configured. Set BING_API_KEY.".into());
    };

    let client = WebSearchClient::with_base_url(&config.search.api_url, api_key)?
        .with_max_results(config.search.max_results);

    let results = client.search(query).await?;
    if results.is_empty() {
        println!("No results.");
    } else {
        println!("{}", WebSearchClient::render(&results));
    }
    Ok(())
}
