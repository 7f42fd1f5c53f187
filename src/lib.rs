//! reclaimarr - find the largest library items nobody has watched recently
//!
//! Items and their on-disk sizes come from Sonarr or Radarr; playback
//! history comes from Tautulli. The analyzer ranks items by size and keeps
//! those with no matching plays within the lookback window.

pub mod app_mode;
pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use app_mode::LibraryMode;
pub use error::{AnalyzerError, HistoryUnavailable};
pub use models::{AnalysisOutcome, LibraryItem, UnwatchedRecord};
