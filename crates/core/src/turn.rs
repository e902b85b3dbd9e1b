//! Turn and scope domain types.
//!
//! A scope is one isolated conversation partition (one guild). Its history is
//! an append-only log of turns; the orchestrator only ever reads a bounded
//! window off the end of it.

use serde::{Deserialize, Serialize};

/// Identifies one isolated conversation context (a guild).
///
/// Created implicitly on first message from that scope; never destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopeId(pub i64);

impl std::fmt::Display for ScopeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
}

impl Speaker {
    pub fn as_str(&self) -> &'static str {
        match self {
            Speaker::User => "user",
            Speaker::Assistant => "assistant",
        }
    }
}

/// One exchange unit in a scope's history. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Assistant,
            text: text.into(),
        }
    }

    /// Encode for the turn log: `"<speaker>: <text>"`.
    pub fn encode(&self) -> String {
        format!("{}: {}", self.speaker.as_str(), self.text)
    }

    /// Decode a turn-log entry.
    ///
    /// Rows written by earlier revisions of the bot prefix assistant turns
    /// with `bot` and user turns with the sender's display name, so `bot`
    /// decodes as an assistant turn and any other unknown prefix as a user
    /// turn. An entry with no separator is treated as bare user text.
    pub fn decode(raw: &str) -> Self {
        match raw.split_once(": ") {
            Some(("assistant" | "bot", text)) => Turn::assistant(text),
            Some((_, text)) => Turn::user(text),
            None => Turn::user(raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_round_trips() {
        let turn = Turn::user("hello there");
        assert_eq!(turn.encode(), "user: hello there");
        assert_eq!(Turn::decode(&turn.encode()), turn);

        let turn = Turn::assistant("hi!");
        assert_eq!(turn.encode(), "assistant: hi!");
        assert_eq!(Turn::decode(&turn.encode()), turn);
    }

    #[test]
    fn legacy_display_name_prefix_decodes_as_user() {
        let turn = Turn::decode("alice: hi");
        assert_eq!(turn.speaker, Speaker::User);
        assert_eq!(turn.text, "hi");
    }

    #[test]
    fn legacy_bot_prefix_decodes_as_assistant() {
        let turn = Turn::decode("bot: hello");
        assert_eq!(turn.speaker, Speaker::Assistant);
        assert_eq!(turn.text, "hello");
    }

    #[test]
    fn bare_text_decodes_as_user() {
        let turn = Turn::decode("no separator here");
        assert_eq!(turn.speaker, Speaker::User);
        assert_eq!(turn.text, "no separator here");
    }

    #[test]
    fn colon_inside_text_is_preserved() {
        let turn = Turn::assistant("ratio: 2:1");
        assert_eq!(Turn::decode(&turn.encode()).text, "ratio: 2:1");
    }

    #[test]
    fn speaker_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Speaker::Assistant).unwrap(), "\"assistant\"");
        assert_eq!(serde_json::to_string(&Speaker::User).unwrap(), "\"user\"");
    }
}
