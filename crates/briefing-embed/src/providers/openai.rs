//! OpenAI embeddings provider implementation
//!
//! This module implements the EmbeddingProvider trait for OpenAI's
//! embedding models. See: https://platform.openai.com/docs/api-reference/embeddings
//!
//! # Examples
//!
//! ## Basic usage with environment variable
//!
//! ```no_run
//! use briefing_embed::EmbeddingProvider;
//! use briefing_embed::providers::OpenAiEmbeddings;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Create provider from OPENAI_API_KEY environment variable
//!     let provider = OpenAiEmbeddings::from_env()?;
//!
//!     let texts = vec!["microsoft beats earnings".to_string()];
//!     let vectors = provider.embed(&texts).await?;
//!     println!("{} dims", vectors[0].len());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Using with OpenAI-compatible APIs
//!
//! ```no_run
//! use briefing_embed::providers::{OpenAiEmbeddings, OpenAiEmbeddingsConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // For local deployments (e.g., llama.cpp, vLLM, text-embeddings-inference)
//! let local_config = OpenAiEmbeddingsConfig::new("not-needed")
//!     .with_api_base("http://localhost:8000/v1")
//!     .with_model("nomic-embed-text-v1.5");
//!
//! let provider = OpenAiEmbeddings::with_config(local_config)?;
//! # Ok(())
//! # }
//! ```

use crate::{EmbeddingProvider, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for the OpenAI embeddings provider
#[derive(Debug, Clone)]
pub struct OpenAiEmbeddingsConfig {
    /// API key for authentication
    pub api_key: String,

    /// Base URL for the OpenAI API (default: "https://api.openai.com/v1")
    /// Can be customized for OpenAI-compatible APIs like Azure OpenAI, local deployments, etc.
    pub api_base: String,

    /// Embedding model identifier (default: "text-embedding-3-small")
    pub model: String,

    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
}

impl OpenAiEmbeddingsConfig {
    /// Create a new config with the given API key and default settings
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: DEFAULT_OPENAI_API_BASE.to_string(),
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Create config from environment variables
    ///
    /// Reads the API key from `OPENAI_API_KEY`.
    /// Optionally reads base URL from `OPENAI_API_BASE` if set.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            crate::EmbeddingError::ConfigurationError(
                "OPENAI_API_KEY environment variable not set".to_string(),
            )
        })?;

        let api_base = std::env::var("OPENAI_API_BASE")
            .unwrap_or_else(|_| DEFAULT_OPENAI_API_BASE.to_string());

        Ok(Self {
            api_key,
            api_base,
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        })
    }

    /// Set custom API base URL
    ///
    /// Useful for Azure OpenAI deployments, local inference servers, and
    /// other OpenAI-compatible embedding APIs.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Set the embedding model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set request timeout in seconds
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

impl Default for OpenAiEmbeddingsConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: DEFAULT_OPENAI_API_BASE.to_string(),
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// OpenAI embeddings provider
///
/// Supports OpenAI embedding models including:
/// - text-embedding-3-small
/// - text-embedding-3-large
/// - text-embedding-ada-002
///
/// Also compatible with OpenAI-compatible APIs through custom configuration.
pub struct OpenAiEmbeddings {
    client: Client,
    config: OpenAiEmbeddingsConfig,
}

impl OpenAiEmbeddings {
    /// Create a new provider with custom configuration
    pub fn with_config(config: OpenAiEmbeddingsConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    /// Create a new provider with API key and default settings
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(OpenAiEmbeddingsConfig::new(api_key))
    }

    /// Create a provider from environment variables
    ///
    /// Reads the API key from the `OPENAI_API_KEY` environment variable.
    /// Optionally reads base URL from `OPENAI_API_BASE` if set.
    pub fn from_env() -> Result<Self> {
        let config = OpenAiEmbeddingsConfig::from_env()?;
        Self::with_config(config)
    }

    /// Get the current configuration
    pub fn config(&self) -> &OpenAiEmbeddingsConfig {
        &self.config
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddings {
    #[instrument(skip(self, texts), fields(model = %self.config.model, count = texts.len()))]
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Sending embeddings request to {}", self.config.api_base);

        let request = EmbeddingsRequest {
            model: self.config.model.clone(),
            input: texts.to_vec(),
        };

        let response = self
            .client
            .post(format!("{}/embeddings", self.config.api_base))
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;

            return Err(match status.as_u16() {
                401 => crate::EmbeddingError::AuthenticationFailed,
                429 => crate::EmbeddingError::RateLimitExceeded(error_text),
                400 => crate::EmbeddingError::InvalidRequest(error_text),
                404 => crate::EmbeddingError::ModelNotFound(self.config.model.clone()),
                _ => crate::EmbeddingError::RequestFailed(format!("HTTP {status}: {error_text}")),
            });
        }

        let embeddings_response: EmbeddingsResponse = response.json().await.map_err(|e| {
            crate::EmbeddingError::UnexpectedResponse(format!("Failed to parse response: {e}"))
        })?;

        if embeddings_response.data.len() != texts.len() {
            return Err(crate::EmbeddingError::UnexpectedResponse(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                embeddings_response.data.len()
            )));
        }

        // The API documents data as index-tagged; realign so output position
        // matches input position even if the server returns rows out of order.
        let mut vectors: Vec<Vec<f32>> = vec![Vec::new(); texts.len()];
        for row in embeddings_response.data {
            let slot = vectors.get_mut(row.index).ok_or_else(|| {
                crate::EmbeddingError::UnexpectedResponse(format!(
                    "Embedding index {} out of range for {} inputs",
                    row.index,
                    texts.len()
                ))
            })?;
            *slot = row.embedding;
        }

        debug!(
            "Received {} embeddings, {} prompt tokens",
            vectors.len(),
            embeddings_response.usage.prompt_tokens
        );

        Ok(vectors)
    }

    fn name(&self) -> &str {
        "openai"
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct EmbeddingsRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingRow>,
    usage: EmbeddingsUsage,
}

#[derive(Debug, Deserialize)]
struct EmbeddingRow {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsUsage {
    prompt_tokens: usize,
}
