//! Article records flowing through the novelty filter

use serde::{Deserialize, Serialize};

/// A freshly fetched article, as handed over by the fetch layer.
///
/// The filter treats this as read-only input; derived fields live on
/// [`NovelArticle`] instead of being patched into the source record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawArticle {
    /// Article headline
    pub title: String,
    /// Article body or feed summary
    #[serde(default)]
    pub content: String,
    /// Original article URL, may be empty
    #[serde(default)]
    pub link: String,
    /// Human-readable source name, when the feed provides one
    #[serde(default)]
    pub source_name: Option<String>,
}

impl RawArticle {
    /// Create an article record
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        link: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            link: link.into(),
            source_name: None,
        }
    }

    /// Attach a source name
    pub fn with_source(mut self, source_name: impl Into<String>) -> Self {
        self.source_name = Some(source_name.into());
        self
    }
}

/// An article the filter accepted as novel, augmented with the derived
/// fields the caller needs to persist it into the memory store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NovelArticle {
    /// The original article, unmodified
    pub article: RawArticle,
    /// SHA-256 of the canonicalized link, empty when the article had no link
    pub canonical_url_hash: String,
    /// SHA-256 of the normalized title
    pub title_fingerprint: String,
    /// Topic embedding computed during filtering, empty when the provider
    /// was unavailable for this run
    pub embedding: Vec<f32>,
}
