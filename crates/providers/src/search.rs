//! Web search client — auxiliary lookup path.
//!
//! Queries a Bing-compatible search endpoint and returns ranked results.
//! Not part of the core message flow; a failure here is terminal for the
//! search command only.

use serde::Deserialize;
use tracing::debug;

use guildmind_core::error::ProviderError;

/// One ranked search result.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Client for a Bing-v7-compatible web search API.
pub struct WebSearchClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
    max_results: usize,
}

impl WebSearchClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, ProviderError> {
        Self::with_base_url("https://api.bing.microsoft.com/v7.0/search", api_key)
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            client,
            max_results: 5,
        })
    }

    /// Cap how many results a query returns.
    pub fn with_max_results(mut self, max: usize) -> Self {
        self.max_results = max.max(1);
        self
    }

    /// Run a search and return the top results.
    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>, ProviderError> {
        debug!(query, "Sending web search request");

        let response = self
            .client
            .get(&self.base_url)
            .query(&[("q", query)])
            .header("Ocp-Apim-Subscription-Key", &self.api_key)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        match status {
            200 => {}
            429 => return Err(ProviderError::RateLimited { retry_after_secs: 5 }),
            401 | 403 => {
                return Err(ProviderError::Unauthorized("Search API key rejected".into()));
            }
            other => {
                return Err(ProviderError::Api {
                    status_code: other,
                    message: response.text().await.unwrap_or_default(),
                });
            }
        }

        let body: SearchApiResponse = response.json().await.map_err(|e| ProviderError::Api {
            status_code: 200,
            message: format!("Failed to parse search response: {e}"),
        })?;

        Ok(parse_results(body, self.max_results))
    }

    /// Render results the way the chat surface shows them: one
    /// "title: url" line per result.
    pub fn render(results: &[SearchResult]) -> String {
        results
            .iter()
            .map(|r| format!("{}: {}", r.title, r.url))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn parse_results(body: SearchApiResponse, limit: usize) -> Vec<SearchResult> {
    body.web_pages
        .map(|pages| {
            pages
                .value
                .into_iter()
                .take(limit)
                .map(|p| SearchResult {
                    title: p.name,
                    url: p.url,
                    snippet: p.snippet.unwrap_or_default(),
                })
                .collect()
        })
        .unwrap_or_default()
}

// --- Bing v7 API types (internal) ---

#[derive(Debug, Deserialize)]
struct SearchApiResponse {
    #[serde(rename = "webPages")]
    web_pages: Option<WebPages>,
}

#[derive(Debug, Deserialize)]
struct WebPages {
    value: Vec<WebPage>,
}

#[derive(Debug, Deserialize)]
struct WebPage {
    name: String,
    url: String,
    #[serde(default)]
    snippet: Option<String>,
}
