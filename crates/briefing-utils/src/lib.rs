//! Shared utilities for briefing-rs
//!
//! This crate provides common functionality used across the briefing-rs
//! workspace: tracing setup and the YAML settings loader that feeds the
//! novelty engine its configuration.

pub mod logging;
pub mod settings;

pub use logging::init_tracing;
pub use settings::{BriefingSettings, SettingsError, WatchItem};
