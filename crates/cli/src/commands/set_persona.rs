//! `guildmind set-persona` — Swap the assistant's system prompt.

use crate::wiring;

pub async fn run(prompt: &str) -> Result<(), Box<dyn std::error::Error>> {
    if prompt.trim().is_empty() {
        return Err("The persona prompt must not be empty.".into());
    }

    let runtime = wiring::build().await?;
    runtime.orchestrator.set_persona_prompt(prompt).await;

    let persona = runtime.orchestrator.persona().await;
    println!("Persona prompt updated for {}", persona.name);
    println!("To make the change permanent, set persona.system_prompt in:");
    println!("  {}", guildmind_config::AppConfig::config_dir().join("config.toml").display());
    Ok(())
}
