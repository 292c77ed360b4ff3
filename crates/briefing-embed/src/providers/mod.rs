//! Concrete embedding provider implementations
//!
//! This module contains implementations of the EmbeddingProvider trait for
//! various embedding services.

#[cfg(feature = "openai")]
pub mod openai;

#[cfg(feature = "openai")]
pub use openai::{OpenAiEmbeddings, OpenAiEmbeddingsConfig};
