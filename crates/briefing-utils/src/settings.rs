//! YAML settings for the briefing process
//!
//! The settings file names the stocks the briefing covers and carries the
//! `news_novelty` section consumed by the dedup engine. A missing file is
//! a startup error; missing individual keys fall back to their defaults.

use briefing_novelty::NoveltyConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading settings
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Settings file missing or unreadable
    #[error("Settings file error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings file is not valid YAML for this schema
    #[error("Settings format error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Settings parsed but carry invalid values
    #[error("Invalid settings: {0}")]
    Invalid(String),
}

/// One stock the briefing tracks: the ticker is the internal key, the name
/// is what news searches and memory entries use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchItem {
    /// Ticker symbol, e.g. "MSFT"
    pub ticker: String,
    /// Company name, e.g. "Microsoft"
    pub name: String,
}

/// Root of the settings file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BriefingSettings {
    /// Stocks the user holds
    pub portfolio: Vec<WatchItem>,
    /// Stocks the user watches without holding
    pub watchlist: Vec<WatchItem>,
    /// Novelty engine configuration
    pub news_novelty: NoveltyConfig,
}

impl BriefingSettings {
    /// Load and validate settings from a YAML file.
    ///
    /// Unlike the news memory store, settings are required: a briefing
    /// without its stock lists cannot run, so failures propagate.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let raw = fs::read_to_string(path)?;
        let settings: Self = serde_yaml::from_str(&raw)?;

        settings
            .news_novelty
            .validate()
            .map_err(|e| SettingsError::Invalid(e.to_string()))?;

        Ok(settings)
    }

    /// Every tracked stock, portfolio first
    pub fn all_items(&self) -> impl Iterator<Item = &WatchItem> {
        self.portfolio.iter().chain(self.watchlist.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_settings(dir: &TempDir, content: &str) -> std::path::PathBuf {
        let path = dir.path().join("settings.yaml");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_full_settings() {
        let dir = TempDir::new().unwrap();
        let path = write_settings(
            &dir,
            r#"
portfolio:
  - ticker: MSFT
    name: Microsoft
watchlist:
  - ticker: NVDA
    name: Nvidia
news_novelty:
  lookback_days: 7
  semantic_threshold: 0.9
"#,
        );

        let settings = BriefingSettings::load(&path).unwrap();
        assert_eq!(settings.portfolio.len(), 1);
        assert_eq!(settings.portfolio[0].name, "Microsoft");
        assert_eq!(settings.news_novelty.lookback_days, 7);
        // unspecified keys keep their defaults
        assert!(settings.news_novelty.exact_url_dedupe);
        assert_eq!(settings.all_items().count(), 2);
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write_settings(&dir, "portfolio: []\n");

        let settings = BriefingSettings::load(&path).unwrap();
        assert!(settings.watchlist.is_empty());
        assert_eq!(settings.news_novelty.lookback_days, 14);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let result = BriefingSettings::load(&dir.path().join("absent.yaml"));
        assert!(matches!(result, Err(SettingsError::Io(_))));
    }

    #[test]
    fn test_invalid_threshold_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_settings(
            &dir,
            "news_novelty:\n  semantic_threshold: 1.5\n",
        );

        let result = BriefingSettings::load(&path);
        assert!(matches!(result, Err(SettingsError::Invalid(_))));
    }
}
