//! `guildmind run` — Start the assistant daemon.

use std::sync::Arc;

use guildmind_core::channel::Channel;
use guildmind_core::event::DomainEvent;
use tracing::{error, info, warn};

use crate::wiring;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let runtime = wiring::build().await?;

    println!("Guildmind daemon starting");
    println!("   Model:   {}", runtime.config.model);
    println!("   Store:   {}", runtime.store.name());
    println!(
        "   Listen:  {}",
        runtime.config.discord.listen_chat_id.as_deref().unwrap_or("all chats")
    );

    if let Some(ops_chat) = runtime.config.discord.ops_chat_id.clone() {
        spawn_ops_forwarder(runtime.channel.clone(), runtime.events.subscribe(), ops_chat);
    }

    let mut rx = runtime.channel.start().await?;
    info!(channel = runtime.channel.name(), "Channel started, waiting for messages");

    while let Some(result) = rx.recv().await {
        match result {
            Ok(msg) => {
                let orchestrator = runtime.orchestrator.clone();
                tokio::spawn(async move {
                    orchestrator.handle_message(&msg).await;
                });
            }
            Err(e) => {
                error!(error = %e, "Channel delivery error");
            }
        }
    }

    info!("Channel closed, shutting down");
    runtime.channel.stop().await?;
    Ok(())
}

/// Forward alert-worthy domain events to the ops chat.
///
/// Only quota exhaustion and auth failures page anyone; everything else
/// stays in the log.
fn spawn_ops_forwarder(
    channel: Arc<guildmind_channels::DiscordChannel>,
    mut events: tokio::sync::broadcast::Receiver<Arc<DomainEvent>>,
    ops_chat_id: String,
) {
    tokio::spawn(async move {
        loop {
            let event = match events.recv().await {
                Ok(event) => event,
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    warn!(skipped = n, "Ops forwarder lagged behind the event bus");
                    continue;
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            };

            let alert = match event.as_ref() {
                DomainEvent::QuotaExhausted { provider, .. } => {
                    Some(format!("Provider `{provider}` is out of quota; replies are degraded."))
                }
                DomainEvent::AuthFailure { provider, .. } => {
                    Some(format!("Provider `{provider}` rejected our credentials; check the API key."))
                }
                _ => None,
            };

            if let Some(text) = alert {
                if let Err(e) = channel.send(&ops_chat_id, &text, None).await {
                    error!(error = %e, "Failed to deliver ops alert");
                }
            }
        }
    });
}
