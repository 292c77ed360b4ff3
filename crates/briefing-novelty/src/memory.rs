//! Durable memory of previously-sent news items
//!
//! The store is a single JSON file holding every item the briefing has
//! delivered, one entry per stock per article. It is loaded once at the
//! start of a run, consulted read-only while filtering, and written back
//! atomically at the end. All I/O failure degrades to an empty or
//! unchanged store; deduplication history is best-effort, the briefing
//! itself must never be blocked by it.

use crate::article::RawArticle;
use crate::canonical::canonical_url_hash;
use crate::error::Result;
use crate::fingerprint::{summary_fingerprint, title_fingerprint};
use crate::similarity::cosine_similarity;
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{error, info, warn};

/// Current on-disk format version
pub const MEMORY_VERSION: u32 = 1;

/// Maximum characters of summary text kept per entry
const SUMMARY_TEXT_LIMIT: usize = 500;

/// One previously-sent news item for one stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryEntry {
    /// Subject key, usually a company name rather than a ticker
    pub stock_name: String,
    /// UTC timestamp (ISO-8601, second precision) when the item was sent
    pub date_sent: String,
    /// SHA-256 of the canonicalized link, empty when the article had no link
    pub canonical_url_hash: String,
    /// SHA-256 of the normalized title
    pub title_fingerprint: String,
    /// SHA-256 of the normalized AI summary; stored, not consulted for dedup
    pub summary_fingerprint: String,
    /// Topic embedding, possibly empty
    pub topic_embedding: Vec<f32>,
    /// Summary text truncated for human inspection
    pub summary_text: String,
    /// Original source name
    pub source: String,
    /// Original article link
    pub link: String,
    /// Original article title
    pub title: String,
}

impl Default for MemoryEntry {
    fn default() -> Self {
        Self {
            stock_name: String::new(),
            date_sent: String::new(),
            canonical_url_hash: String::new(),
            title_fingerprint: String::new(),
            summary_fingerprint: String::new(),
            topic_embedding: Vec::new(),
            summary_text: String::new(),
            source: String::new(),
            link: String::new(),
            title: String::new(),
        }
    }
}

impl MemoryEntry {
    /// Build an entry from a delivered article.
    ///
    /// `date_sent` defaults to the current UTC time; tests and replays can
    /// pin it explicitly.
    pub fn from_article(
        stock_name: impl Into<String>,
        article: &RawArticle,
        summary_text: &str,
        topic_embedding: Vec<f32>,
        date_sent: Option<DateTime<Utc>>,
    ) -> Self {
        let sent = date_sent.unwrap_or_else(Utc::now);

        Self {
            stock_name: stock_name.into(),
            date_sent: format_timestamp(sent),
            canonical_url_hash: canonical_url_hash(&article.link),
            title_fingerprint: title_fingerprint(&article.title),
            summary_fingerprint: summary_fingerprint(summary_text),
            topic_embedding,
            summary_text: summary_text.chars().take(SUMMARY_TEXT_LIMIT).collect(),
            source: article.source_name.clone().unwrap_or_default(),
            link: article.link.clone(),
            title: article.title.clone(),
        }
    }

    /// Parse `date_sent`, returning `None` when it is empty or malformed.
    pub fn sent_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.date_sent)
    }
}

/// Format a timestamp the way the store expects it: UTC, second precision,
/// no offset suffix.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// Parse a stored timestamp. Accepts the store's own format, RFC 3339, and
/// fractional seconds; a trailing `Z` is tolerated.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if raw.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    let stripped = raw.strip_suffix('Z').unwrap_or(raw);
    NaiveDateTime::parse_from_str(stripped, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// The full dedup history: a versioned, append-only sequence of entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsMemory {
    /// On-disk format version
    pub version: u32,
    /// Previously-sent items, oldest first
    pub entries: Vec<MemoryEntry>,
}

impl Default for NewsMemory {
    fn default() -> Self {
        Self {
            version: MEMORY_VERSION,
            entries: Vec::new(),
        }
    }
}

impl NewsMemory {
    /// Load the store from disk.
    ///
    /// A missing file is the normal first-run case and yields an empty
    /// store; unreadable or malformed content is logged and also yields an
    /// empty store. Never fails: over-sending beats crashing the briefing.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match Self::try_load(path) {
            Ok(memory) => memory,
            Err(e) => {
                error!("Failed to load news memory from {}: {e}", path.display());
                Self::default()
            }
        }
    }

    fn try_load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let memory: Self = serde_json::from_str(&raw)?;
        Ok(memory)
    }

    /// Write the store back to disk atomically: serialize to a temp file in
    /// the same directory, then rename over the target so a crash mid-write
    /// cannot leave a corrupt store behind.
    ///
    /// Failure is logged and swallowed; the in-memory state stays intact
    /// and the next run simply sees stale history.
    pub fn save(&self, path: &Path) {
        if let Err(e) = self.try_save(path) {
            error!("Failed to save news memory to {}: {e}", path.display());
        }
    }

    fn try_save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp_path = path.with_extension("tmp");
        let serialized = serde_json::to_string_pretty(self)?;
        fs::write(&tmp_path, serialized)?;
        fs::rename(&tmp_path, path)?;
        Ok(())
    }

    /// Entries for one stock within the lookback window.
    ///
    /// `lookback_days <= 0` disables the time filter. Entries whose
    /// timestamp cannot be parsed are treated as still valid: failing open
    /// keeps their dedup keys active rather than silently expiring them.
    pub fn entries_for_stock(&self, stock_name: &str, lookback_days: i64) -> Vec<&MemoryEntry> {
        let cutoff = if lookback_days > 0 {
            Some(Utc::now() - Duration::days(lookback_days))
        } else {
            None
        };

        self.entries
            .iter()
            .filter(|entry| entry.stock_name == stock_name)
            .filter(|entry| match (cutoff, entry.sent_at()) {
                (Some(cutoff), Some(sent_at)) => sent_at >= cutoff,
                _ => true,
            })
            .collect()
    }

    /// Drop entries older than `retention_days` regardless of stock.
    ///
    /// `retention_days <= 0` is a no-op. Returns the number of entries
    /// removed so the caller can log the delta.
    pub fn prune(&mut self, retention_days: i64) -> usize {
        if retention_days <= 0 {
            return 0;
        }

        let cutoff = Utc::now() - Duration::days(retention_days);
        let before = self.entries.len();
        self.entries
            .retain(|entry| match entry.sent_at() {
                Some(sent_at) => sent_at >= cutoff,
                None => true,
            });

        let removed = before - self.entries.len();
        if removed > 0 {
            info!("Pruned {removed} expired entries from news memory");
        }
        removed
    }

    /// Append entries for items that were just delivered.
    ///
    /// Append-only by design: the filter guarantees it does not hand back
    /// duplicates within a run, and cross-run duplicates are what the
    /// filter itself suppresses on the next run.
    pub fn record(&mut self, new_entries: Vec<MemoryEntry>) {
        for entry in &new_entries {
            if entry.title_fingerprint.is_empty() {
                warn!(
                    "Recording entry without title fingerprint for stock {}",
                    entry.stock_name
                );
            }
        }
        self.entries.extend(new_entries);
    }
}

/// Does the candidate's URL hash or title fingerprint exactly match any of
/// the given entries? Empty hashes and fingerprints never match.
pub fn is_exact_duplicate(
    stock_entries: &[&MemoryEntry],
    canonical_url_hash: &str,
    title_fingerprint: &str,
    exact_url_dedupe: bool,
    exact_title_dedupe: bool,
) -> bool {
    stock_entries.iter().any(|entry| {
        (exact_url_dedupe
            && !canonical_url_hash.is_empty()
            && entry.canonical_url_hash == canonical_url_hash)
            || (exact_title_dedupe
                && !title_fingerprint.is_empty()
                && entry.title_fingerprint == title_fingerprint)
    })
}

/// A memory entry that semantically matched a candidate.
#[derive(Debug, Clone, Copy)]
pub struct SemanticMatch<'a> {
    /// The matching entry
    pub entry: &'a MemoryEntry,
    /// Cosine similarity between candidate and entry embeddings
    pub score: f32,
}

/// Best semantic match for a candidate embedding among the given entries.
///
/// The search keeps the first entry seen on exact score ties (strict `>`)
/// and only reports a match at or above the threshold. Entries without an
/// embedding are skipped; a degenerate candidate matches nothing.
pub fn find_semantic_match<'a>(
    stock_entries: &[&'a MemoryEntry],
    candidate_embedding: &[f32],
    threshold: f32,
) -> Option<SemanticMatch<'a>> {
    if candidate_embedding.is_empty() {
        return None;
    }

    let mut best: Option<SemanticMatch<'a>> = None;
    for entry in stock_entries {
        if entry.topic_embedding.is_empty() {
            continue;
        }
        let score = cosine_similarity(candidate_embedding, &entry.topic_embedding);
        if best.is_none_or(|b| score > b.score) {
            best = Some(SemanticMatch { entry, score });
        }
    }

    best.filter(|m| m.score >= threshold)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(stock: &str, date_sent: &str, title: &str) -> MemoryEntry {
        MemoryEntry {
            stock_name: stock.to_string(),
            date_sent: date_sent.to_string(),
            title_fingerprint: title_fingerprint(title),
            title: title.to_string(),
            ..MemoryEntry::default()
        }
    }

    #[test]
    fn test_load_missing_file_yields_empty_store() {
        let dir = TempDir::new().unwrap();
        let memory = NewsMemory::load(&dir.path().join("absent.json"));
        assert_eq!(memory.version, MEMORY_VERSION);
        assert!(memory.entries.is_empty());
    }

    #[test]
    fn test_load_corrupt_file_yields_empty_store() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("news_memory.json");
        fs::write(&path, "{not valid json").unwrap();

        let memory = NewsMemory::load(&path);
        assert!(memory.entries.is_empty());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache").join("news_memory.json");

        let mut memory = NewsMemory::default();
        memory.record(vec![MemoryEntry::from_article(
            "Microsoft",
            &RawArticle::new(
                "Microsoft beats earnings",
                "Strong cloud growth.",
                "https://example.com/msft",
            ),
            "Microsoft reported strong earnings.",
            vec![1.0, 0.0],
            None,
        )]);
        memory.save(&path);

        let reloaded = NewsMemory::load(&path);
        assert_eq!(reloaded, memory);
        // temp file must not linger after the atomic rename
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("deep").join("nested").join("memory.json");
        NewsMemory::default().save(&path);
        assert!(path.exists());
    }

    #[test]
    fn test_entries_for_stock_filters_by_name() {
        let mut memory = NewsMemory::default();
        memory.record(vec![
            entry("Microsoft", "2026-02-20T07:00:00", "MSFT news"),
            entry("Nvidia", "2026-02-20T07:00:00", "NVDA news"),
        ]);

        let selected = memory.entries_for_stock("Microsoft", 0);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].stock_name, "Microsoft");
    }

    #[test]
    fn test_entries_for_stock_applies_lookback_window() {
        let now = Utc::now();
        let recent = format_timestamp(now - Duration::days(2));
        let stale = format_timestamp(now - Duration::days(30));

        let mut memory = NewsMemory::default();
        memory.record(vec![
            entry("Microsoft", &recent, "recent"),
            entry("Microsoft", &stale, "stale"),
        ]);

        let selected = memory.entries_for_stock("Microsoft", 14);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].title, "recent");

        // lookback <= 0 disables the window
        assert_eq!(memory.entries_for_stock("Microsoft", 0).len(), 2);
    }

    #[test]
    fn test_unparseable_timestamps_fail_open() {
        let mut memory = NewsMemory::default();
        memory.record(vec![entry("Microsoft", "not-a-date", "mystery")]);

        assert_eq!(memory.entries_for_stock("Microsoft", 1).len(), 1);
        assert_eq!(memory.prune(1), 0);
        assert_eq!(memory.entries.len(), 1);
    }

    #[test]
    fn test_prune_removes_expired_entries() {
        let now = Utc::now();
        let mut memory = NewsMemory::default();
        memory.record(vec![
            entry("Microsoft", &format_timestamp(now - Duration::days(40)), "old"),
            entry("Nvidia", &format_timestamp(now - Duration::days(1)), "new"),
        ]);

        let removed = memory.prune(30);
        assert_eq!(removed, 1);
        assert_eq!(memory.entries.len(), 1);
        assert_eq!(memory.entries[0].title, "new");
    }

    #[test]
    fn test_prune_zero_retention_is_noop() {
        let mut memory = NewsMemory::default();
        memory.record(vec![entry("Microsoft", "2020-01-01T00:00:00", "ancient")]);

        assert_eq!(memory.prune(0), 0);
        assert_eq!(memory.prune(-5), 0);
        assert_eq!(memory.entries.len(), 1);
    }

    #[test]
    fn test_timestamp_parsing_tolerates_variants() {
        assert!(parse_timestamp("2026-02-20T07:00:00").is_some());
        assert!(parse_timestamp("2026-02-20T07:00:00Z").is_some());
        assert!(parse_timestamp("2026-02-20T07:00:00.123456").is_some());
        assert!(parse_timestamp("2026-02-20T07:00:00+00:00").is_some());
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_is_exact_duplicate_matches_url_and_title() {
        let mut seen = entry("Microsoft", "2026-02-20T07:00:00", "MSFT beats earnings");
        seen.canonical_url_hash = "abc123".to_string();
        let entries = [&seen];

        assert!(is_exact_duplicate(
            &entries,
            "abc123",
            "other-fp",
            true,
            true
        ));
        assert!(is_exact_duplicate(
            &entries,
            "other-hash",
            &title_fingerprint("MSFT beats earnings"),
            true,
            true
        ));
        assert!(!is_exact_duplicate(
            &entries,
            "other-hash",
            "other-fp",
            true,
            true
        ));
    }

    #[test]
    fn test_is_exact_duplicate_respects_toggles() {
        let mut seen = entry("Microsoft", "2026-02-20T07:00:00", "MSFT beats earnings");
        seen.canonical_url_hash = "abc123".to_string();
        let entries = [&seen];
        let fp = title_fingerprint("MSFT beats earnings");

        assert!(!is_exact_duplicate(&entries, "abc123", &fp, false, false));
        assert!(is_exact_duplicate(&entries, "abc123", "x", true, false));
        assert!(is_exact_duplicate(&entries, "x", &fp, false, true));
    }

    #[test]
    fn test_is_exact_duplicate_ignores_empty_keys() {
        let seen = entry("Microsoft", "2026-02-20T07:00:00", "");
        // a linkless, empty-title entry must not match other linkless articles
        let entries = [&seen];
        assert!(!is_exact_duplicate(&entries, "", "", true, true));
    }

    #[test]
    fn test_find_semantic_match_respects_threshold() {
        let mut close = entry("Microsoft", "2026-02-20T07:00:00", "close");
        close.topic_embedding = vec![0.99, 0.01];
        let mut far = entry("Microsoft", "2026-02-20T07:00:00", "far");
        far.topic_embedding = vec![0.0, 1.0];
        let entries = [&far, &close];

        let matched = find_semantic_match(&entries, &[1.0, 0.0], 0.86).unwrap();
        assert_eq!(matched.entry.title, "close");
        assert!(matched.score > 0.99);

        assert!(find_semantic_match(&entries, &[1.0, 0.0], 0.9999).is_none());
    }

    #[test]
    fn test_find_semantic_match_skips_entries_without_embeddings() {
        let bare = entry("Microsoft", "2026-02-20T07:00:00", "bare");
        let entries = [&bare];
        assert!(find_semantic_match(&entries, &[1.0, 0.0], 0.5).is_none());
        assert!(find_semantic_match(&entries, &[], 0.5).is_none());
    }

    #[test]
    fn test_from_article_truncates_summary_and_hashes_link() {
        let article = RawArticle::new(
            "Alphabet AI update",
            "Gemini update details",
            "https://news.example.com/alphabet-ai?utm_source=x",
        )
        .with_source("Example");

        let long_summary = "s".repeat(600);
        let entry =
            MemoryEntry::from_article("Alphabet", &article, &long_summary, vec![1.0], None);

        assert_eq!(entry.summary_text.chars().count(), 500);
        assert_eq!(entry.source, "Example");
        assert!(!entry.canonical_url_hash.is_empty());
        assert!(!entry.title_fingerprint.is_empty());
        assert_eq!(
            entry.canonical_url_hash,
            canonical_url_hash("https://news.example.com/alphabet-ai")
        );
        assert!(entry.sent_at().is_some());
    }

    #[test]
    fn test_from_article_without_link_has_empty_url_hash() {
        let article = RawArticle::new("Linkless story", "body", "");
        let entry = MemoryEntry::from_article("Microsoft", &article, "summary", vec![], None);
        assert_eq!(entry.canonical_url_hash, "");
        assert!(!entry.title_fingerprint.is_empty());
    }
}
