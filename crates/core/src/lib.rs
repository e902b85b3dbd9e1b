//! # Guildmind Core
//!
//! Domain types, traits, and error definitions for the guildmind
//! conversational assistant. This crate has **zero framework dependencies** —
//! it defines the domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every subsystem is defined as a trait here. Implementations live in their
//! respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod channel;
pub mod error;
pub mod event;
pub mod persona;
pub mod provider;
pub mod store;
pub mod turn;

// Re-export key types at crate root for ergonomics
pub use channel::{Channel, ChannelId, ChannelMessage};
pub use error::{Error, Result};
pub use event::{DomainEvent, EventBus};
pub use persona::Persona;
pub use provider::{ChatMessage, CompletionProvider, CompletionRequest, CompletionResponse, Role};
pub use store::{CachedAnswer, ContextStore, EphemeralCache};
pub use turn::{ScopeId, Speaker, Turn};
