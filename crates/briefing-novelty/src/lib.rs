//! News novelty and deduplication engine
//!
//! This crate decides, across runs and across fetch sources, which news
//! articles are genuinely new for a stock versus already covered. It layers
//! three comparisons:
//!
//! - Canonical URL hashes: the same link minus tracking noise
//! - Title fingerprints: the same headline minus case and punctuation
//! - Topic embeddings: the same story told differently, caught by cosine
//!   similarity against a time-windowed memory of delivered items
//!
//! # Architecture
//!
//! A [`NoveltySession`] spans one briefing run: it loads the [`NewsMemory`]
//! store once, serves any number of per-stock [`NoveltyFilter`] invocations
//! (safe to run concurrently, the store is only read), and commits the
//! prune/record/save sequence at the end. Embeddings come from a
//! [`briefing_embed::EmbeddingProvider`] behind a [`BatchedEmbedder`] that
//! chunks requests and bounds in-flight calls.
//!
//! Deduplication is a best-effort optimization: every failure mode inside
//! this crate logs and degrades toward treating articles as new, because a
//! repeated story in the briefing is cheaper than a silently dropped one.
//!
//! # Example
//!
//! ```rust,ignore
//! use briefing_embed::providers::OpenAiEmbeddings;
//! use briefing_novelty::{MemoryEntry, NoveltyConfig, NoveltySession, RawArticle};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let provider = Arc::new(OpenAiEmbeddings::from_env().expect("OPENAI_API_KEY"));
//!     let session = NoveltySession::begin(
//!         "cache/news_memory.json",
//!         NoveltyConfig::default(),
//!         provider,
//!     );
//!
//!     let batch = vec![RawArticle::new(
//!         "Microsoft Q4 earnings beat expectations",
//!         "Cloud growth carried the quarter.",
//!         "https://news.example.com/msft-q4",
//!     )];
//!     let result = session.filter_stock("Microsoft", &batch).await;
//!
//!     // deliver result.new_items, then persist them:
//!     let delivered = result
//!         .new_items
//!         .iter()
//!         .map(|item| {
//!             MemoryEntry::from_article(
//!                 "Microsoft",
//!                 &item.article,
//!                 "summary text",
//!                 item.embedding.clone(),
//!                 None,
//!             )
//!         })
//!         .collect();
//!     session.commit(delivered);
//! }
//! ```

pub mod article;
pub mod canonical;
pub mod config;
pub mod embedder;
pub mod error;
pub mod filter;
pub mod fingerprint;
pub mod memory;
pub mod pipeline;
pub mod similarity;

// Re-export main types for convenience
pub use article::{NovelArticle, RawArticle};
pub use canonical::{canonical_url_hash, canonicalize_url};
pub use config::{NoveltyConfig, NoveltyConfigBuilder};
pub use embedder::BatchedEmbedder;
pub use error::{NoveltyError, Result};
pub use filter::{NoveltyFilter, NoveltyResult, NoveltyStats, SuppressReason, SuppressedTopic};
pub use fingerprint::{fingerprint_text, normalize_text, summary_fingerprint, title_fingerprint};
pub use memory::{MemoryEntry, NewsMemory, SemanticMatch, find_semantic_match, is_exact_duplicate};
pub use pipeline::NoveltySession;
pub use similarity::cosine_similarity;
