//! Chat platform adapters for guildmind.
//!
//! Each adapter implements the [`Channel`](guildmind_core::Channel) trait
//! and relays messages between a platform and the orchestrator.
//!
//! Available channels:
//! - **Discord** — Discord Bot API (stub, needs a gateway crate in production)

pub mod discord;

pub use discord::{DiscordChannel, DiscordConfig};
