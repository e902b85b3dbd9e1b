//! # Guildmind Providers
//!
//! Client-side contract with the completion provider:
//! - [`OpenAiCompatProvider`] — any OpenAI-compatible `/v1/chat/completions`
//!   endpoint
//! - [`QuotaGuard`] — pre-flight availability probe with operational
//!   notifications
//! - [`RetryingClient`] — linear-backoff retry on rate limits; resolves every
//!   provider failure to `None` instead of an error
//! - [`WebSearchClient`] — auxiliary web-search lookup

pub mod openai_compat;
pub mod quota;
pub mod retry;
pub mod search;

pub use openai_compat::OpenAiCompatProvider;
pub use quota::QuotaGuard;
pub use retry::{RetryPolicy, RetryingClient};
pub use search::{SearchResult, WebSearchClient};
