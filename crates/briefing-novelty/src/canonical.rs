//! URL canonicalization for stable deduplication keys
//!
//! News feeds hand out the same article under many slightly different URLs:
//! tracking parameters, `www.` prefixes, fragments, and shuffled query
//! strings. Canonicalization collapses those variants into one comparison
//! key so the exact-dedup pass can match an article across sources and runs.

use sha2::{Digest, Sha256};
use url::Url;

/// Query parameters that carry tracking state and never identify content.
/// Matched case-insensitively against parameter names.
const TRACKING_PARAMS: [&str; 14] = [
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "gclid",
    "fbclid",
    "mc_cid",
    "mc_eid",
    "ref",
    "src",
    "mkt",
    "oc",
    "aid",
];

fn is_tracking_param(name: &str) -> bool {
    let lowered = name.to_lowercase();
    TRACKING_PARAMS.iter().any(|p| *p == lowered)
}

/// Normalize a raw article URL into a stable comparison key.
///
/// - Tracking query parameters are dropped (case-insensitive)
/// - Remaining query pairs are sorted by key
/// - Scheme and host are lowercased, a leading `www.` is stripped
/// - The fragment is dropped
///
/// Empty input yields an empty string. Input that does not parse as a URL
/// degrades to the trimmed, lowercased original so identical garbage still
/// compares equal. The function is idempotent.
pub fn canonicalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let Ok(mut parsed) = Url::parse(trimmed) else {
        return trimmed.to_lowercase();
    };

    let mut query: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(k, _)| !is_tracking_param(k))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    query.sort_by(|a, b| a.0.cmp(&b.0));

    if query.is_empty() {
        parsed.set_query(None);
    } else {
        parsed.query_pairs_mut().clear().extend_pairs(&query);
    }
    parsed.set_fragment(None);

    if let Some(host) = parsed.host_str() {
        let lowered = host.to_lowercase();
        let stripped = lowered.strip_prefix("www.").unwrap_or(&lowered).to_string();
        // set_host only fails for schemes that cannot carry a host
        let _ = parsed.set_host(Some(&stripped));
    }

    parsed.to_string()
}

/// SHA-256 hex digest of the canonicalized URL, or an empty string when the
/// article carries no link.
pub fn canonical_url_hash(raw: &str) -> String {
    let canonical = canonicalize_url(raw);
    if canonical.is_empty() {
        return String::new();
    }
    format!("{:x}", Sha256::digest(canonical.as_bytes()))
}
