//! `guildmind clear` — Wipe a scope's conversation context.

use guildmind_core::turn::ScopeId;

use crate::wiring;

pub async fn run(scope_id: i64) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = wiring::build().await?;

    runtime.orchestrator.clear_context(ScopeId(scope_id)).await?;
    println!("Context cleared for scope {scope_id}");
    Ok(())
}
