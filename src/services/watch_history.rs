//! Watch-history index
//!
//! Turns a history service's playback events into a lowercase title -> play
//! count map for one library section and lookback window.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use crate::app_mode::SectionType;
use crate::error::HistoryUnavailable;
use crate::models::{LibrarySection, PlaybackEvent};
use crate::services::tautulli::HistoryService;

/// Days counted per "month" of lookback.
pub const DAYS_PER_MONTH: i64 = 30;

/// Lowercased subject title -> plays within the lookback window.
///
/// Keys are never empty and counts are at least one. Whitespace-only titles
/// are kept as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchIndex {
    counts: BTreeMap<String, u32>,
}

impl WatchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_events<'a>(events: impl IntoIterator<Item = &'a PlaybackEvent>) -> Self {
        let mut index = Self::new();
        for event in events {
            index.record_play(&event.subject_title);
        }
        index
    }

    /// Build an index from precomputed counts. Zero counts and empty titles are skipped.
    pub fn from_counts<'a>(counts: impl IntoIterator<Item = (&'a str, u32)>) -> Self {
        let mut index = Self::new();
        for (title, plays) in counts {
            if plays == 0 || title.is_empty() {
                continue;
            }
            *index.counts.entry(title.to_lowercase()).or_insert(0) += plays;
        }
        index
    }

    /// Count one play of `title`. Empty titles are discarded.
    pub fn record_play(&mut self, title: &str) {
        if title.is_empty() {
            return;
        }
        *self.counts.entry(title.to_lowercase()).or_insert(0) += 1;
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Exact lookup of an already-lowercased key.
    pub fn contains(&self, key: &str) -> bool {
        self.counts.contains_key(key)
    }

    pub fn play_count(&self, title: &str) -> u32 {
        self.counts.get(&title.to_lowercase()).copied().unwrap_or(0)
    }

    /// Keys in sorted order.
    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.counts.keys().map(String::as_str)
    }

    /// Top `n` titles by play count, ties broken alphabetically.
    pub fn most_watched(&self, n: usize) -> Vec<(&str, u32)> {
        let mut ranked: Vec<(&str, u32)> = self
            .counts
            .iter()
            .map(|(title, plays)| (title.as_str(), *plays))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(n);
        ranked
    }
}

/// Epoch seconds `months` x 30 days before `now`.
///
/// Months are fixed 30-day blocks, not calendar months. A window reaching
/// past the earliest representable date clamps to it, covering all history.
pub fn cutoff_epoch(now: DateTime<Utc>, months: u32) -> i64 {
    Duration::try_days(DAYS_PER_MONTH * i64::from(months))
        .and_then(|window| now.checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
        .timestamp()
}

/// Pick the section to query: the one matching both type and name, else the
/// first of the right type.
pub fn select_section<'a>(
    sections: &'a [LibrarySection],
    section_type: SectionType,
    library_name: &str,
) -> Option<&'a LibrarySection> {
    sections
        .iter()
        .find(|s| s.section_type == section_type && s.section_name == library_name)
        .or_else(|| {
            let fallback = sections.iter().find(|s| s.section_type == section_type);
            if let Some(section) = fallback {
                warn!(
                    library_name = %library_name,
                    fallback = %section.section_name,
                    section_type = %section_type,
                    "Configured library not found, falling back to first section of matching type"
                );
            }
            fallback
        })
}

/// Build the run's watch index from the history service.
///
/// Section listing fails soft (logged, treated as no sections). A missing
/// section or a failed history query is returned as [`HistoryUnavailable`].
pub async fn build_watch_index(
    history: &dyn HistoryService,
    section_type: SectionType,
    library_name: &str,
    cutoff_epoch: i64,
) -> Result<WatchIndex, HistoryUnavailable> {
    let sections = match history.list_sections().await {
        Ok(sections) => sections,
        Err(e) => {
            warn!(error = %format!("{e:#}"), "Failed to list history library sections");
            Vec::new()
        }
    };

    let section = select_section(&sections, section_type, library_name).ok_or_else(|| {
        HistoryUnavailable::NoMatchingLibrarySection {
            section_type,
            library_name: library_name.to_string(),
        }
    })?;

    debug!(
        section_id = section.section_id,
        section_name = %section.section_name,
        section_type = %section_type,
        "Using history library section"
    );

    let events = history
        .query_history(section, cutoff_epoch)
        .await
        .map_err(|e| HistoryUnavailable::QueryFailed(format!("{e:#}")))?;

    let index = WatchIndex::from_events(&events);
    debug!(
        events = events.len(),
        titles = index.len(),
        cutoff_epoch,
        "Watch index built"
    );
    Ok(index)
}
