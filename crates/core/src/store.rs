//! Storage traits — the durable turn log and the expiring session cache.
//!
//! The Context Store owns per-scope turn history (durable, unbounded; reads
//! are windowed). The Ephemeral Cache owns short-lived session state such as
//! recent Q/A pairs, and is deliberately independent of the Context Store: an
//! outage on one must not take down the other's behavior.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CacheError, StoreError};
use crate::turn::{ScopeId, Turn};

/// The durable, per-scope turn log.
///
/// Implementations: PostgreSQL, in-memory (for testing).
#[async_trait]
pub trait ContextStore: Send + Sync {
    /// The backend name (e.g., "postgres", "in_memory").
    fn name(&self) -> &str;

    /// Append one turn to the scope's log, preserving submission order
    /// within the scope.
    async fn append(&self, scope: ScopeId, turn: &Turn) -> std::result::Result<(), StoreError>;

    /// Read the last `n` turns for a scope, oldest-first. An unknown scope
    /// yields an empty window, not an error.
    async fn read_window(
        &self,
        scope: ScopeId,
        n: usize,
    ) -> std::result::Result<Vec<Turn>, StoreError>;

    /// Wipe the turn log for a scope.
    async fn clear(&self, scope: ScopeId) -> std::result::Result<(), StoreError>;
}

/// A question/answer pair kept in the session cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedAnswer {
    pub question: String,
    pub response: String,
    pub cached_at: DateTime<Utc>,
}

impl CachedAnswer {
    pub fn new(question: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            response: response.into(),
            cached_at: Utc::now(),
        }
    }
}

/// Fast, expiring key-value store for session-scoped data.
///
/// `get` returns `None` both when the key was never set and when it has
/// expired; callers cannot tell the difference and must not need to.
#[async_trait]
pub trait EphemeralCache: Send + Sync {
    /// The backend name.
    fn name(&self) -> &str;

    /// Store a value with an expiry. Overwriting an existing key resets
    /// its TTL.
    async fn put(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> std::result::Result<(), CacheError>;

    /// Fetch a live value, or `None`.
    async fn get(&self, key: &str) -> std::result::Result<Option<String>, CacheError>;
}

/// Helpers for the per-user Q/A history the FAQ matcher reads.
///
/// The history is stored as a JSON array under one key per user so a single
/// `get` fetches the whole session.
pub mod qa_history {
    use super::CachedAnswer;

    pub fn key(user_id: &str) -> String {
        format!("qa:{user_id}")
    }

    pub fn decode(raw: &str) -> Vec<CachedAnswer> {
        serde_json::from_str(raw).unwrap_or_default()
    }

    pub fn encode(history: &[CachedAnswer]) -> String {
        serde_json::to_string(history).unwrap_or_else(|_| "[]".into())
    }
}
