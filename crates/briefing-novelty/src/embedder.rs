//! Batched, concurrency-bounded access to the embedding provider
//!
//! The filter needs embeddings for whole batches of candidate texts, but
//! the provider boundary is rate-limited and can fail outright. This
//! wrapper chunks requests to a fixed batch size, bounds simultaneous
//! in-flight requests with a shared semaphore (one per pipeline run, shared
//! across all stocks), and converts any provider failure into "no
//! embeddings for this call" so the filter can fall back to exact-only
//! dedup.

use briefing_embed::EmbeddingProvider;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::warn;

/// Shared embedding access for one pipeline run.
///
/// Cloning is cheap and shares the provider and the semaphore, so every
/// stock filtered in a run draws from the same concurrency budget.
#[derive(Clone)]
pub struct BatchedEmbedder {
    provider: Arc<dyn EmbeddingProvider>,
    batch_size: usize,
    semaphore: Arc<Semaphore>,
}

impl BatchedEmbedder {
    /// Create an embedder over the given provider.
    ///
    /// `batch_size` bounds texts per request; `max_concurrent` bounds
    /// simultaneous requests across every clone of this embedder.
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        batch_size: usize,
        max_concurrent: usize,
    ) -> Self {
        Self {
            provider,
            batch_size: batch_size.max(1),
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// Embed every text, in order.
    ///
    /// Returns `None` when any batch fails: a partial embedding set would
    /// let some candidates skip semantic dedup while others get it, so
    /// failure is total for the call and the caller degrades to exact-only
    /// dedup. Output vectors align positionally with the input texts.
    pub async fn embed_all(&self, texts: &[String]) -> Option<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Some(Vec::new());
        }

        let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            let permit = self.semaphore.acquire().await.ok()?;
            let result = self.provider.embed(batch).await;
            drop(permit);

            match result {
                Ok(batch_vectors) if batch_vectors.len() == batch.len() => {
                    vectors.extend(batch_vectors);
                }
                Ok(batch_vectors) => {
                    warn!(
                        "Embedding provider returned {} vectors for {} texts, \
                         falling back to exact dedup",
                        batch_vectors.len(),
                        batch.len()
                    );
                    return None;
                }
                Err(e) => {
                    warn!("Embedding request failed, falling back to exact dedup: {e}");
                    return None;
                }
            }
        }

        Some(vectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use briefing_embed::EmbeddingError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Returns one fixed vector per input text and counts calls.
    struct CountingProvider {
        calls: AtomicUsize,
        max_batch_seen: AtomicUsize,
    }

    impl CountingProvider {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                max_batch_seen: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl EmbeddingProvider for CountingProvider {
        async fn embed(&self, texts: &[String]) -> briefing_embed::Result<Vec<Vec<f32>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.max_batch_seen
                .fetch_max(texts.len(), Ordering::SeqCst);
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl EmbeddingProvider for FailingProvider {
        async fn embed(&self, _texts: &[String]) -> briefing_embed::Result<Vec<Vec<f32>>> {
            Err(EmbeddingError::RequestFailed("boom".to_string()))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    #[tokio::test]
    async fn test_empty_input_embeds_to_empty() {
        let provider = Arc::new(CountingProvider::new());
        let embedder = BatchedEmbedder::new(provider.clone(), 32, 3);

        let result = embedder.embed_all(&[]).await;
        assert_eq!(result, Some(Vec::new()));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_batches_are_chunked() {
        let provider = Arc::new(CountingProvider::new());
        let embedder = BatchedEmbedder::new(provider.clone(), 2, 3);

        let texts: Vec<String> = (0..5).map(|i| format!("text {i}")).collect();
        let vectors = embedder.embed_all(&texts).await.unwrap();

        assert_eq!(vectors.len(), 5);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
        assert_eq!(provider.max_batch_seen.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_provider_failure_is_total() {
        let embedder = BatchedEmbedder::new(Arc::new(FailingProvider), 32, 3);
        let texts = vec!["a".to_string(), "b".to_string()];
        assert_eq!(embedder.embed_all(&texts).await, None);
    }

    #[tokio::test]
    async fn test_misaligned_response_is_total_failure() {
        struct ShortProvider;

        #[async_trait]
        impl EmbeddingProvider for ShortProvider {
            async fn embed(&self, _texts: &[String]) -> briefing_embed::Result<Vec<Vec<f32>>> {
                Ok(vec![vec![1.0]])
            }

            fn name(&self) -> &str {
                "short"
            }
        }

        let embedder = BatchedEmbedder::new(Arc::new(ShortProvider), 32, 3);
        let texts = vec!["a".to_string(), "b".to_string()];
        assert_eq!(embedder.embed_all(&texts).await, None);
    }
}
