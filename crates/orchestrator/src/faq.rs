//! FAQ shortcut — answer near-duplicate questions from the session cache.
//!
//! Matching is a cheap containment heuristic, not semantic similarity:
//! over-broad matches are an accepted tradeoff for skipping a provider call.
//! The contract is "at most one cached answer, or none", first match in
//! history order.

use guildmind_core::store::CachedAnswer;

/// Find a cached answer for a near-duplicate of `new_question`.
///
/// Case-insensitive, whitespace-trimmed containment in either direction:
/// "what is mewing??" matches a cached "what is mewing" and vice versa.
/// Returns the first hit in history order (oldest first, as stored).
pub fn match_cached<'a>(new_question: &str, history: &'a [CachedAnswer]) -> Option<&'a str> {
    let needle = new_question.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }

    history
        .iter()
        .find(|qa| {
            let cached = qa.question.trim().to_lowercase();
            !cached.is_empty() && (needle.contains(&cached) || cached.contains(&needle))
        })
        .map(|qa| qa.response.as_str())
}
