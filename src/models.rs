//! Domain types shared across the pipeline.

use serde::{Deserialize, Deserializer, Serialize};

use crate::app_mode::SectionType;

/// An item as listed by the library manager, before its size is known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub path: Option<String>,
}

/// An inventory item with its on-disk size attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryItem {
    pub id: i64,
    pub title: String,
    pub path: Option<String>,
    pub size_on_disk: u64,
}

impl LibraryItem {
    pub fn from_inventory(item: InventoryItem, size_on_disk: u64) -> Self {
        Self {
            id: item.id,
            title: item.title,
            path: item.path,
            size_on_disk,
        }
    }
}

/// A typed partition of the history service's catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibrarySection {
    #[serde(deserialize_with = "id_from_number_or_string")]
    pub section_id: i64,
    pub section_type: SectionType,
    #[serde(default)]
    pub section_name: String,
}

/// One playback of a show episode or a movie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackEvent {
    /// Show name for TV content, movie title for films. May be empty.
    pub subject_title: String,
    pub viewed_at: i64,
}

/// A library item nobody watched within the lookback window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnwatchedRecord {
    pub id: i64,
    pub title: String,
    #[serde(rename = "size")]
    pub size_bytes: u64,
    #[serde(rename = "size_human")]
    pub human_size: String,
    pub path: String,
}

/// Result of one analysis run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisOutcome {
    /// Unwatched items, largest first.
    pub unwatched: Vec<UnwatchedRecord>,
    /// Number of ranked candidates that were checked against the history.
    pub candidates_checked: usize,
}

impl AnalysisOutcome {
    pub fn total_reclaimable_bytes(&self) -> u64 {
        self.unwatched.iter().map(|r| r.size_bytes).sum()
    }
}

/// Tautulli returns ids as numbers on some versions and numeric strings on others.
pub(crate) fn id_from_number_or_string<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(i64),
        Text(String),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Number(n) => Ok(n),
        RawId::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}
