//! `guildmind ask` — One context-free question, one answer.

use crate::wiring;

pub async fn run(question: &str) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = wiring::build().await?;

    eprint!("  Thinking...");
    let answer = runtime.orchestrator.ask_once(question).await;
    eprint!("\r             \r");

    match answer {
        Some(text) => {
            println!("{text}");
            Ok(())
        }
        None => Err("The provider could not produce an answer. Check the log for details.".into()),
    }
}
