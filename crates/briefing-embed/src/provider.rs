//! Embedding provider trait definition

use crate::Result;
use async_trait::async_trait;

/// Trait for embedding providers
///
/// Implementations of this trait provide access to different embedding
/// services (e.g., OpenAI, Azure OpenAI, local deployments).
///
/// The returned vectors must align positionally with the input texts:
/// `output[i]` is the embedding of `texts[i]`.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of texts into vectors
    ///
    /// # Arguments
    ///
    /// * `texts` - The texts to embed, in order
    ///
    /// # Returns
    ///
    /// One vector per input text, in input order
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Get the provider name (e.g., "openai")
    fn name(&self) -> &str;
}
