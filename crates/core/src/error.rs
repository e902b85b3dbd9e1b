//! Error types for the guildmind domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all guildmind operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Channel errors ---
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    // --- Context store errors ---
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    // --- Ephemeral cache errors ---
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures when talking to the completion provider.
///
/// Only `RateLimited` is ever retried; everything else is terminal for the
/// current message but never for the process.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    Api { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authorization failed: {0}")]
    Unauthorized(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl ProviderError {
    /// Whether this error is a rate-limit signal (the only retryable kind).
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, ProviderError::RateLimited { .. })
    }
}

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("Channel not configured: {0}")]
    NotConfigured(String),

    #[error("Message delivery failed to {channel}: {reason}")]
    DeliveryFailed { channel: String, reason: String },

    #[error("Channel connection lost: {0}")]
    ConnectionLost(String),
}

/// Turn-log storage failures. The orchestrator degrades on these rather than
/// failing the message: reads fall back to an empty window, appends no-op.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),
}

/// Ephemeral cache failures. A cache outage degrades the FAQ shortcut only.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache unavailable: {0}")]
    Unavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::Provider(ProviderError::Api {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn only_rate_limit_is_retryable() {
        assert!(ProviderError::RateLimited { retry_after_secs: 5 }.is_rate_limit());
        assert!(!ProviderError::Unauthorized("bad key".into()).is_rate_limit());
        assert!(!ProviderError::Network("conn refused".into()).is_rate_limit());
    }

    #[test]
    fn store_error_wraps_into_top_level() {
        let err: Error = StoreError::Unavailable("pool exhausted".into()).into();
        assert!(err.to_string().contains("pool exhausted"));
    }
}
