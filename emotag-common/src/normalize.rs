//! Sentence normalization
//!
//! Normalized sentences are the cache key: two raw sentences that differ
//! only in case, punctuation spacing, or non-ASCII decoration must map to
//! the same key, or the same text gets processed and stored twice with
//! identical results.

/// Normalize a raw sentence into its canonical cache-key form.
///
/// Lowercases, drops non-ASCII characters (the model vocabulary is
/// ASCII-only), collapses runs of whitespace, and trims. Idempotent.
pub fn normalise_sentence(sentence: &str) -> String {
    let lowered = sentence.to_lowercase();

    let mut normalised = String::with_capacity(lowered.len());
    let mut pending_space = false;
    for ch in lowered.chars() {
        if ch.is_whitespace() {
            pending_space = true;
            continue;
        }
        if !ch.is_ascii() {
            continue;
        }
        if pending_space && !normalised.is_empty() {
            normalised.push(' ');
        }
        pending_space = false;
        normalised.push(ch);
    }

    normalised
}
