//! Persona — the assistant's voice.
//!
//! Holds the system prompt sent with every completion and the fixed set of
//! fallback lines shown when a reply cannot be produced. Fallback lines stay
//! in-character so an outage reads like the bot having a moment, never like a
//! stack trace.

use serde::{Deserialize, Serialize};

/// The assistant's configured identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Persona {
    /// Display name the persona refers to itself by.
    pub name: String,

    /// System prompt prepended to every completion request.
    pub system_prompt: String,

    /// Persona-consistent outage/apology lines. One is chosen uniformly at
    /// random when a message ends in fallback. Never empty: an empty config
    /// value falls back to the defaults.
    pub fallback_lines: Vec<String>,
}

impl Persona {
    /// Replace the system prompt, keeping name and fallback lines.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn default_fallback_lines() -> Vec<String> {
        [
            "Whoa, the wires just crossed. Give me a sec!",
            "System's taking a timeout... be right back!",
            "Hold up, I glitched for a moment there.",
            "Who unplugged something? The whole thing just bounced!",
            "Not my fault, I promise — something upstream broke!",
            "Brain went out for lunch. Back soon!",
            "No clue what broke, but I definitely can't answer right now.",
            "Taking five, the circuits are tired.",
            "Don't panic, I just froze up. I'll recover!",
            "Is this a bot or a brick right now? Honestly, unclear.",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }
}

impl Default for Persona {
    fn default() -> Self {
        Self {
            name: "Guildmind".into(),
            system_prompt: "You are Guildmind, a laid-back assistant hanging out in a community \
                            chat. You reply naturally, like a person typing, with current internet \
                            slang used sparingly and in context. Keep answers concise — never \
                            longer than a couple of paragraphs — go easy on emoji, and read the \
                            room: if someone is serious, drop the jokes and actually help. Vary \
                            your phrasing so the conversation never feels canned."
                .into(),
            fallback_lines: Self::default_fallback_lines(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_persona_has_fallback_lines() {
        let persona = Persona::default();
        assert!(!persona.fallback_lines.is_empty());
        assert!(!persona.system_prompt.is_empty());
    }

    #[test]
    fn with_system_prompt_keeps_fallbacks() {
        let persona = Persona::default().with_system_prompt("You are a strict tutor.");
        assert_eq!(persona.system_prompt, "You are a strict tutor.");
        assert_eq!(persona.fallback_lines, Persona::default_fallback_lines());
    }
}
