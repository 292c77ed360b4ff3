//! Run-level session tying the store, config, and filter together
//!
//! One briefing run is one session: load the store once, filter any number
//! of stocks against it (concurrently if the caller wants), then commit:
//! prune, record what was actually delivered, and write the store back
//! atomically. The session owns the store for the run, so there is exactly
//! one writer and one save.

use crate::article::RawArticle;
use crate::config::NoveltyConfig;
use crate::embedder::BatchedEmbedder;
use crate::filter::{NoveltyFilter, NoveltyResult};
use crate::memory::{MemoryEntry, NewsMemory};
use briefing_embed::EmbeddingProvider;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// One pipeline run's view of the novelty engine.
pub struct NoveltySession {
    path: PathBuf,
    config: NoveltyConfig,
    memory: NewsMemory,
    filter: NoveltyFilter,
}

impl NoveltySession {
    /// Open a session: load the store from `path` (empty on first run or
    /// on unreadable content) and wire the embedder up to the provider
    /// with the configured batch size and concurrency limit.
    pub fn begin(
        path: impl Into<PathBuf>,
        config: NoveltyConfig,
        provider: Arc<dyn EmbeddingProvider>,
    ) -> Self {
        let path = path.into();
        let memory = NewsMemory::load(&path);
        let embedder = BatchedEmbedder::new(
            provider,
            config.embedding_batch_size,
            config.max_concurrent_embeddings,
        );

        info!(
            "News novelty session started with {} remembered entries",
            memory.entries.len()
        );

        Self {
            path,
            config,
            memory,
            filter: NoveltyFilter::new(embedder),
        }
    }

    /// The store as loaded for this run
    pub fn memory(&self) -> &NewsMemory {
        &self.memory
    }

    /// The effective configuration
    pub fn config(&self) -> &NoveltyConfig {
        &self.config
    }

    /// Filter one stock's fetch batch against the session store.
    ///
    /// Takes `&self`: per-stock invocations may run concurrently, all
    /// reading the same store and drawing from the same embedding
    /// concurrency budget.
    pub async fn filter_stock(
        &self,
        stock_name: &str,
        raw_articles: &[RawArticle],
    ) -> NoveltyResult {
        self.filter
            .run(stock_name, raw_articles, &self.memory, &self.config)
            .await
    }

    /// Filter several stocks concurrently, preserving input order of the
    /// batches in the output.
    pub async fn filter_many(
        &self,
        batches: &[(String, Vec<RawArticle>)],
    ) -> Vec<(String, NoveltyResult)> {
        let tasks = batches.iter().map(|(stock_name, articles)| async move {
            let result = self.filter_stock(stock_name, articles).await;
            (stock_name.clone(), result)
        });
        futures::future::join_all(tasks).await
    }

    /// Close the run: prune expired history, record the entries that were
    /// actually delivered, and write the store back atomically.
    ///
    /// Consumes the session; a new run starts with a fresh `begin`, which
    /// is what keeps the store single-writer.
    pub fn commit(mut self, delivered: Vec<MemoryEntry>) {
        self.memory.prune(self.config.retention_days);
        if !delivered.is_empty() {
            info!("Recording {} new entries into news memory", delivered.len());
        }
        self.memory.record(delivered);
        self.memory.save(&self.path);
    }
}
