//! Configuration for the novelty filter

use crate::error::{NoveltyError, Result};
use serde::{Deserialize, Serialize};

/// Configuration for novelty filtering and memory retention.
///
/// Deserializes from the `news_novelty` section of the settings file;
/// every field falls back to its documented default when absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NoveltyConfig {
    /// Memory window consulted during dedup, in days. Zero or negative
    /// disables the time filter and considers all entries for a stock.
    pub lookback_days: i64,

    /// Cosine similarity cutoff for semantic duplicates, in [0, 1]
    pub semantic_threshold: f32,

    /// Match candidates against canonical URL hashes
    pub exact_url_dedupe: bool,

    /// Match candidates against title fingerprints
    pub exact_title_dedupe: bool,

    /// How long entries stay in the store before pruning, in days.
    /// Zero or negative disables pruning.
    pub retention_days: i64,

    /// Maximum texts per embedding request
    pub embedding_batch_size: usize,

    /// Maximum simultaneous in-flight embedding requests
    pub max_concurrent_embeddings: usize,
}

impl Default for NoveltyConfig {
    fn default() -> Self {
        Self {
            lookback_days: 14,
            semantic_threshold: 0.86,
            exact_url_dedupe: true,
            exact_title_dedupe: true,
            retention_days: 30,
            embedding_batch_size: 32,
            max_concurrent_embeddings: 3,
        }
    }
}

impl NoveltyConfig {
    /// Create a new configuration builder
    pub fn builder() -> NoveltyConfigBuilder {
        NoveltyConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.semantic_threshold) {
            return Err(NoveltyError::Config(format!(
                "semantic_threshold must be in [0, 1], got {}",
                self.semantic_threshold
            )));
        }

        if self.embedding_batch_size == 0 {
            return Err(NoveltyError::Config(
                "embedding_batch_size must be greater than 0".to_string(),
            ));
        }

        if self.max_concurrent_embeddings == 0 {
            return Err(NoveltyError::Config(
                "max_concurrent_embeddings must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for NoveltyConfig
#[derive(Debug, Default)]
pub struct NoveltyConfigBuilder {
    lookback_days: Option<i64>,
    semantic_threshold: Option<f32>,
    exact_url_dedupe: Option<bool>,
    exact_title_dedupe: Option<bool>,
    retention_days: Option<i64>,
    embedding_batch_size: Option<usize>,
    max_concurrent_embeddings: Option<usize>,
}

impl NoveltyConfigBuilder {
    /// Set the memory lookback window in days
    pub fn lookback_days(mut self, days: i64) -> Self {
        self.lookback_days = Some(days);
        self
    }

    /// Set the semantic similarity threshold
    pub fn semantic_threshold(mut self, threshold: f32) -> Self {
        self.semantic_threshold = Some(threshold);
        self
    }

    /// Enable or disable URL-based exact dedup
    pub fn exact_url_dedupe(mut self, enabled: bool) -> Self {
        self.exact_url_dedupe = Some(enabled);
        self
    }

    /// Enable or disable title-based exact dedup
    pub fn exact_title_dedupe(mut self, enabled: bool) -> Self {
        self.exact_title_dedupe = Some(enabled);
        self
    }

    /// Set the store retention window in days
    pub fn retention_days(mut self, days: i64) -> Self {
        self.retention_days = Some(days);
        self
    }

    /// Set the maximum texts per embedding request
    pub fn embedding_batch_size(mut self, size: usize) -> Self {
        self.embedding_batch_size = Some(size);
        self
    }

    /// Set the maximum simultaneous embedding requests
    pub fn max_concurrent_embeddings(mut self, limit: usize) -> Self {
        self.max_concurrent_embeddings = Some(limit);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<NoveltyConfig> {
        let defaults = NoveltyConfig::default();

        let config = NoveltyConfig {
            lookback_days: self.lookback_days.unwrap_or(defaults.lookback_days),
            semantic_threshold: self
                .semantic_threshold
                .unwrap_or(defaults.semantic_threshold),
            exact_url_dedupe: self.exact_url_dedupe.unwrap_or(defaults.exact_url_dedupe),
            exact_title_dedupe: self
                .exact_title_dedupe
                .unwrap_or(defaults.exact_title_dedupe),
            retention_days: self.retention_days.unwrap_or(defaults.retention_days),
            embedding_batch_size: self
                .embedding_batch_size
                .unwrap_or(defaults.embedding_batch_size),
            max_concurrent_embeddings: self
                .max_concurrent_embeddings
                .unwrap_or(defaults.max_concurrent_embeddings),
        };

        config.validate()?;
        Ok(config)
    }
}
