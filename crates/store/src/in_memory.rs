//! In-memory turn log — useful for testing and ephemeral sessions.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use guildmind_core::error::StoreError;
use guildmind_core::store::ContextStore;
use guildmind_core::turn::{ScopeId, Turn};

/// A context store that keeps every scope's log in a Vec.
/// Useful for tests and sessions where persistence isn't needed.
pub struct InMemoryContextStore {
    scopes: Arc<RwLock<HashMap<ScopeId, Vec<Turn>>>>,
}

impl InMemoryContextStore {
    pub fn new() -> Self {
        Self {
            scopes: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Total turns stored across all scopes.
    pub async fn total_turns(&self) -> usize {
        self.scopes.read().await.values().map(Vec::len).sum()
    }
}

impl Default for InMemoryContextStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContextStore for InMemoryContextStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn append(&self, scope: ScopeId, turn: &Turn) -> Result<(), StoreError> {
        self.scopes
            .write()
            .await
            .entry(scope)
            .or_default()
            .push(turn.clone());
        Ok(())
    }

    async fn read_window(&self, scope: ScopeId, n: usize) -> Result<Vec<Turn>, StoreError> {
        let scopes = self.scopes.read().await;
        let Some(log) = scopes.get(&scope) else {
            return Ok(Vec::new());
        };
        let start = log.len().saturating_sub(n);
        Ok(log[start..].to_vec())
    }

    async fn clear(&self, scope: ScopeId) -> Result<(), StoreError> {
        if let Some(log) = self.scopes.write().await.get_mut(&scope) {
            log.clear();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_scope_yields_empty_window() {
        let store = InMemoryContextStore::new();
        let window = store.read_window(ScopeId(99), 6).await.unwrap();
        assert!(window.is_empty());
    }

    #[tokio::test]
    async fn window_preserves_append_order() {
        let store = InMemoryContextStore::new();
        let scope = ScopeId(42);
        store.append(scope, &Turn::user("hi")).await.unwrap();
        store.append(scope, &Turn::assistant("hello")).await.unwrap();

        let window = store.read_window(scope, 6).await.unwrap();
        assert_eq!(window.len(), 2);
        assert_eq!(window[0], Turn::user("hi"));
        assert_eq!(window[1], Turn::assistant("hello"));
    }

    #[tokio::test]
    async fn window_is_bounded_and_most_recent() {
        let store = InMemoryContextStore::new();
        let scope = ScopeId(1);
        for i in 0..10 {
            store.append(scope, &Turn::user(format!("msg {i}"))).await.unwrap();
        }

        let window = store.read_window(scope, 6).await.unwrap();
        assert_eq!(window.len(), 6);
        assert_eq!(window[0].text, "msg 4");
        assert_eq!(window[5].text, "msg 9");
    }

    #[tokio::test]
    async fn scopes_are_isolated() {
        let store = InMemoryContextStore::new();
        store.append(ScopeId(1), &Turn::user("in scope 1")).await.unwrap();
        store.append(ScopeId(2), &Turn::user("in scope 2")).await.unwrap();

        let window = store.read_window(ScopeId(1), 6).await.unwrap();
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].text, "in scope 1");
    }

    #[tokio::test]
    async fn clear_wipes_only_that_scope() {
        let store = InMemoryContextStore::new();
        store.append(ScopeId(1), &Turn::user("a")).await.unwrap();
        store.append(ScopeId(2), &Turn::user("b")).await.unwrap();

        store.clear(ScopeId(1)).await.unwrap();
        assert!(store.read_window(ScopeId(1), 6).await.unwrap().is_empty());
        assert_eq!(store.read_window(ScopeId(2), 6).await.unwrap().len(), 1);
    }
}
