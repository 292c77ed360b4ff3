//! Embedding provider abstraction layer for briefing-rs
//!
//! This crate provides provider-agnostic access to text-embedding services.
//! It includes:
//!
//! - The [`EmbeddingProvider`] trait for embedding backends
//! - Error types shared by all providers
//! - Concrete provider implementations (behind feature flags)
//!
//! The novelty engine consumes this boundary to turn article text into
//! vectors for semantic deduplication; any OpenAI-compatible embeddings
//! endpoint can back it.

pub mod error;
pub mod provider;

// Re-export main types
pub use error::{EmbeddingError, Result};
pub use provider::EmbeddingProvider;

// Provider implementations (feature-gated)
#[cfg(feature = "openai")]
pub mod providers;
