//! Guildmind CLI — the main entry point.
//!
//! Commands:
//! - `run`         — Start the assistant daemon (channel + orchestrator)
//! - `ask`         — Send one context-free question and print the answer
//! - `clear`       — Wipe a scope's conversation context
//! - `set-persona` — Swap the assistant's system prompt
//! - `search`      — Run a web search and print the results
//! - `status`      — Show effective configuration and provider health

use clap::{Parser, Subcommand};

mod commands;
mod wiring;

#[derive(Parser)]
#[command(
    name = "guildmind",
    about = "Guildmind — a resilient conversational assistant for community chat",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the assistant daemon
    Run,

    /// Ask a single question without conversation context
    Ask {
        /// The question text
        question: String,
    },

    /// Wipe the stored conversation context for a scope
    Clear {
        /// The scope (guild) ID to clear
        scope_id: i64,
    },

    /// Swap the assistant's system prompt
    SetPersona {
        /// The new system prompt
        prompt: String,
    },

    /// Run a web search
    Search {
        /// The query text
        query: String,
    },

    /// Show effective configuration and provider health
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Run => commands::run::run().await?,
        Commands::Ask { question } => commands::ask::run(&question).await?,
        Commands::Clear { scope_id } => commands::clear::run(scope_id).await?,
        Commands::SetPersona { prompt } => commands::set_persona::run(&prompt).await?,
        Commands::Search { query } => commands::search::run(&query).await?,
        Commands::Status => commands::status::run().await?,
    }

    Ok(())
}
