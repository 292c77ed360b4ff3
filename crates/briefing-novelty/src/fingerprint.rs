//! Text normalization and hash fingerprints
//!
//! Titles arrive from feeds with inconsistent casing, punctuation, and
//! spacing. Normalization flattens those differences; the fingerprint is a
//! SHA-256 hex digest of the normalized text, used as the exact-match dedup
//! key for titles and summaries.

use sha2::{Digest, Sha256};

/// Lowercase, replace every non-alphanumeric non-whitespace character with a
/// space, collapse whitespace runs, and trim.
pub fn normalize_text(text: &str) -> String {
    let lowered = text.to_lowercase();
    let cleaned: String = lowered
        .chars()
        .map(|ch| {
            if ch.is_alphanumeric() || ch.is_whitespace() {
                ch
            } else {
                ' '
            }
        })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// SHA-256 hex digest of the normalized text.
///
/// Two inputs differing only in case, punctuation, or spacing produce the
/// same fingerprint. Empty or punctuation-only input fingerprints the empty
/// string, which callers treat as "no fingerprint".
pub fn fingerprint_text(text: &str) -> String {
    format!("{:x}", Sha256::digest(normalize_text(text).as_bytes()))
}

/// Fingerprint of an article title.
pub fn title_fingerprint(title: &str) -> String {
    fingerprint_text(title)
}

/// Fingerprint of an AI summary. Stored alongside entries for forward
/// compatibility; the filter does not currently consult it.
pub fn summary_fingerprint(summary: &str) -> String {
    fingerprint_text(summary)
}
