//! # Guildmind Orchestrator
//!
//! Composes the stores, the quota-guarded completion client, the FAQ
//! shortcut, and the response formatter into the end-to-end "handle one
//! incoming message" flow, and owns the failure-fallback policy: a message
//! either gets a real reply or one persona-consistent fallback line, never a
//! raw error.

pub mod faq;
pub mod format;
mod orchestrator;

pub use format::{MAX_MESSAGE_LEN, chunk};
pub use orchestrator::Orchestrator;
