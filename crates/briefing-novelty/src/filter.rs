//! The novelty filter: layered deduplication for one stock's fetch batch
//!
//! Two passes. Pass 1 is pure computation: canonical URL hashes and title
//! fingerprints against the memory window and the batch so far. Pass 2
//! costs a network round trip: embeddings for the survivors, best-match
//! cosine search against remembered topics and against this batch's own
//! accepted and rejected items. Every failure mode degrades toward
//! "treat as new": re-sending a near-duplicate is acceptable, suppressing
//! a genuinely new story is not.

use crate::article::{NovelArticle, RawArticle};
use crate::canonical::canonical_url_hash;
use crate::config::NoveltyConfig;
use crate::embedder::BatchedEmbedder;
use crate::fingerprint::{normalize_text, title_fingerprint};
use crate::memory::{MemoryEntry, NewsMemory, find_semantic_match, is_exact_duplicate};
use crate::similarity::cosine_similarity;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// Characters of article content that participate in the embedding input
const EMBED_CONTENT_LIMIT: usize = 1000;

/// Why an article was withheld from the briefing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuppressReason {
    /// URL hash or title fingerprint matched memory or an earlier item in
    /// the same batch
    ExactDuplicate,
    /// Embedding similarity reached the configured threshold
    SemanticDuplicate,
}

/// Audit record for a suppressed article, consumed by the report layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuppressedTopic {
    /// Original article title
    pub title: String,
    /// Original article link
    pub link: String,
    /// Suppression cause
    pub reason: SuppressReason,
    /// Best similarity score for semantic suppressions, rounded to four
    /// decimals; absent for exact duplicates
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f32>,
}

/// Counters for one filter invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoveltyStats {
    /// Articles in the input batch
    pub fetched: usize,
    /// Pass-1 rejections
    pub exact_dupes: usize,
    /// Pass-2 rejections
    pub semantic_dupes: usize,
    /// Articles accepted as novel
    pub new_count: usize,
}

/// Output of one filter invocation for one stock.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NoveltyResult {
    /// Novel articles in input order, augmented with their derived fields
    pub new_items: Vec<NovelArticle>,
    /// Suppressed articles with cause, for the audit trail
    pub suppressed_known_topics: Vec<SuppressedTopic>,
    /// Invocation counters
    pub stats: NoveltyStats,
}

/// A pass-1 survivor awaiting semantic checks.
struct Candidate {
    article: RawArticle,
    url_hash: String,
    title_fp: String,
}

/// Stateless novelty filter over a shared embedder.
///
/// All history lives in the [`NewsMemory`] passed per call; the filter
/// reads it and never writes, so one filter may serve concurrent per-stock
/// invocations over the same store.
pub struct NoveltyFilter {
    embedder: BatchedEmbedder,
}

impl NoveltyFilter {
    /// Create a filter over the given embedder
    pub fn new(embedder: BatchedEmbedder) -> Self {
        Self { embedder }
    }

    /// Split a fetch batch into novel items and suppressed duplicates.
    ///
    /// Relative order of `new_items` follows `raw_articles`. The memory
    /// store is only read; persisting accepted items back is the caller's
    /// job after a successful send.
    pub async fn run(
        &self,
        stock_name: &str,
        raw_articles: &[RawArticle],
        memory: &NewsMemory,
        config: &NoveltyConfig,
    ) -> NoveltyResult {
        let stock_entries = memory.entries_for_stock(stock_name, config.lookback_days);

        let mut stats = NoveltyStats {
            fetched: raw_articles.len(),
            ..NoveltyStats::default()
        };
        let mut suppressed_known_topics = Vec::new();

        // Pass 1: exact dedup against memory and the batch so far
        let mut candidates: Vec<Candidate> = Vec::new();
        let mut seen_url_hashes: HashSet<String> = HashSet::new();
        let mut seen_title_fps: HashSet<String> = HashSet::new();

        for article in raw_articles {
            let url_hash = canonical_url_hash(&article.link);
            let title_fp = title_fingerprint(&article.title);

            let duplicate_in_batch = (config.exact_url_dedupe
                && !url_hash.is_empty()
                && seen_url_hashes.contains(&url_hash))
                || (config.exact_title_dedupe
                    && !title_fp.is_empty()
                    && seen_title_fps.contains(&title_fp));
            let duplicate_in_memory = is_exact_duplicate(
                &stock_entries,
                &url_hash,
                &title_fp,
                config.exact_url_dedupe,
                config.exact_title_dedupe,
            );

            if duplicate_in_batch || duplicate_in_memory {
                stats.exact_dupes += 1;
                suppressed_known_topics.push(SuppressedTopic {
                    title: article.title.clone(),
                    link: article.link.clone(),
                    reason: SuppressReason::ExactDuplicate,
                    similarity: None,
                });
                continue;
            }

            seen_url_hashes.insert(url_hash.clone());
            seen_title_fps.insert(title_fp.clone());
            candidates.push(Candidate {
                article: article.clone(),
                url_hash,
                title_fp,
            });
        }

        if candidates.is_empty() {
            debug!("{stock_name}: no candidates survived exact dedup");
            return NoveltyResult {
                new_items: Vec::new(),
                suppressed_known_topics,
                stats,
            };
        }

        // Pass 2: semantic dedup over the survivors
        let inputs: Vec<String> = candidates
            .iter()
            .map(|c| embedding_input(&c.article))
            .collect();
        let embeddings = self.embedder.embed_all(&inputs).await;
        if embeddings.is_none() {
            debug!("{stock_name}: no embeddings available, accepting all exact-dedup survivors");
        }

        let mut new_items: Vec<NovelArticle> = Vec::new();
        let mut accepted_embeddings: Vec<Vec<f32>> = Vec::new();
        let mut rejected_embeddings: Vec<Vec<f32>> = Vec::new();

        for (idx, candidate) in candidates.into_iter().enumerate() {
            let candidate_embedding: &[f32] = embeddings
                .as_ref()
                .map_or(&[], |vectors| vectors[idx].as_slice());

            let duplicate_score = best_duplicate_score(
                &stock_entries,
                &accepted_embeddings,
                &rejected_embeddings,
                candidate_embedding,
                config.semantic_threshold,
            );

            if let Some(score) = duplicate_score {
                stats.semantic_dupes += 1;
                suppressed_known_topics.push(SuppressedTopic {
                    title: candidate.article.title.clone(),
                    link: candidate.article.link.clone(),
                    reason: SuppressReason::SemanticDuplicate,
                    similarity: Some(round_similarity(score)),
                });
                // Rejected items stay in the comparison pool: a third
                // near-duplicate in this batch should match them even when
                // the memory entry they themselves matched is further away.
                if !candidate_embedding.is_empty() {
                    rejected_embeddings.push(candidate_embedding.to_vec());
                }
                continue;
            }

            if !candidate_embedding.is_empty() {
                accepted_embeddings.push(candidate_embedding.to_vec());
            }
            new_items.push(NovelArticle {
                article: candidate.article,
                canonical_url_hash: candidate.url_hash,
                title_fingerprint: candidate.title_fp,
                embedding: candidate_embedding.to_vec(),
            });
        }

        stats.new_count = new_items.len();
        debug!(
            "{stock_name}: {} fetched, {} exact dupes, {} semantic dupes, {} new",
            stats.fetched, stats.exact_dupes, stats.semantic_dupes, stats.new_count
        );

        NoveltyResult {
            new_items,
            suppressed_known_topics,
            stats,
        }
    }
}

/// Text handed to the embedding provider for one article: normalized title
/// plus the leading slice of the content.
fn embedding_input(article: &RawArticle) -> String {
    let content: String = article.content.chars().take(EMBED_CONTENT_LIMIT).collect();
    normalize_text(&format!("{}\n{}", article.title, content))
}

/// Best similarity at or above the threshold across the memory window and
/// both in-batch pools, or `None` when the candidate is not a duplicate.
///
/// First-seen wins on exact score ties (strict `>` inside each search);
/// acceptance as a duplicate uses `>=` against the threshold.
fn best_duplicate_score(
    stock_entries: &[&MemoryEntry],
    accepted: &[Vec<f32>],
    rejected: &[Vec<f32>],
    candidate_embedding: &[f32],
    threshold: f32,
) -> Option<f32> {
    if candidate_embedding.is_empty() {
        return None;
    }

    let memory_score =
        find_semantic_match(stock_entries, candidate_embedding, threshold).map(|m| m.score);

    let mut batch_score: Option<f32> = None;
    for reference in accepted.iter().chain(rejected.iter()) {
        let score = cosine_similarity(candidate_embedding, reference);
        if batch_score.is_none_or(|best| score > best) {
            batch_score = Some(score);
        }
    }
    let batch_score = batch_score.filter(|score| *score >= threshold);

    match (memory_score, batch_score) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    }
}

fn round_similarity(score: f32) -> f32 {
    (score * 10_000.0).round() / 10_000.0
}
