//! # Guildmind Store
//!
//! Backends for the two storage seams in `guildmind-core`:
//! - [`ContextStore`](guildmind_core::ContextStore) — the durable per-scope
//!   turn log (PostgreSQL, or in-memory for tests)
//! - [`EphemeralCache`](guildmind_core::EphemeralCache) — the TTL-bound
//!   session cache

pub mod in_memory;
pub mod ttl_cache;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use in_memory::InMemoryContextStore;
pub use ttl_cache::TtlCache;

#[cfg(feature = "postgres")]
pub use postgres::PostgresContextStore;
