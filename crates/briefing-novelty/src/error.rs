//! Error types for the novelty engine

use thiserror::Error;

/// Result type alias for novelty operations
pub type Result<T> = std::result::Result<T, NoveltyError>;

/// Errors raised by the fallible inner layer of the novelty engine.
///
/// The public entry points (store load/save, the filter) catch these, log,
/// and degrade: a briefing run must never abort because deduplication
/// could not read or persist its history.
#[derive(Debug, Error)]
pub enum NoveltyError {
    /// Memory store file could not be read or written
    #[error("Memory store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Memory store content could not be encoded or decoded
    #[error("Memory store format error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
