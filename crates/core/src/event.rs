//! Domain event system — decoupled communication between bounded contexts.
//!
//! Events are published when something operationally interesting happens.
//! The daemon subscribes and forwards the alert-worthy ones to the ops
//! channel; nothing here ever reaches the chat surface directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// All domain events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// A qualifying message was received from a channel
    MessageReceived {
        scope_id: i64,
        sender_id: String,
        content_preview: String,
        timestamp: DateTime<Utc>,
    },

    /// The provider generated a response
    ResponseGenerated {
        scope_id: i64,
        model: String,
        tokens_used: u32,
        timestamp: DateTime<Utc>,
    },

    /// The quota guard found the provider rate-limited
    QuotaExhausted {
        provider: String,
        timestamp: DateTime<Utc>,
    },

    /// The quota guard hit an authorization failure
    AuthFailure {
        provider: String,
        timestamp: DateTime<Utc>,
    },

    /// A message was answered from the Q/A cache without a provider call
    CacheHit {
        scope_id: i64,
        timestamp: DateTime<Utc>,
    },

    /// A fallback line was served instead of a real reply
    FallbackServed {
        scope_id: i64,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    /// A scope's turn log was wiped
    ContextCleared {
        scope_id: i64,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for domain events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub. Components
/// subscribe to receive all events and filter for what they care about.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: DomainEvent) {
        // Ignore send errors (no subscribers = that's fine)
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
