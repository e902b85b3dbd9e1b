//! Response formatter — split provider output to fit the transport.
//!
//! Chunks are contiguous, non-overlapping, in original order, and their
//! concatenation equals the input exactly. Nothing is ever dropped; naive
//! truncation at the limit is precisely the bug this replaces.

/// The transport's maximum message size, in characters.
pub const MAX_MESSAGE_LEN: usize = 2000;

/// Split `text` into ordered chunks of at most `limit` characters each.
///
/// Empty input yields no chunks. Splitting counts characters, not bytes, so
/// a multibyte reply never lands on a broken boundary.
pub fn chunk(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut count = 0;

    for ch in text.chars() {
        if count == limit {
            chunks.push(std::mem::take(&mut current));
            count = 0;
        }
        current.push(ch);
        count += 1;
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}
