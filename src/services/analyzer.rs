//! Unwatched-item analysis
//!
//! One run is a straight line: inventory, concurrent size lookups, ranking,
//! a single watch index for the lookback window, concurrent title matching
//! against that shared index, then filtering. Any trouble with the history
//! service leaves the index empty, which reports every candidate as
//! unwatched rather than silently hiding reclaimable space.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::task::JoinError;
use tracing::{debug, info, warn};

use crate::app_mode::LibraryMode;
use crate::error::{AnalyzerError, Result};
use crate::models::{AnalysisOutcome, LibraryItem, UnwatchedRecord};
use crate::services::fanout::gather_indexed;
use crate::services::file_utils::format_bytes;
use crate::services::ranking::SizeRanker;
use crate::services::servarr::LibraryManager;
use crate::services::tautulli::HistoryService;
use crate::services::title_matcher::find_watch_match;
use crate::services::watch_history::{WatchIndex, build_watch_index, cutoff_epoch};

/// Shown instead of a path when the library manager has none.
pub const UNKNOWN_PATH: &str = "Unknown";

/// How many of the most watched titles to log in verbose mode.
const MOST_WATCHED_LOG_COUNT: usize = 10;

/// Per-run analysis settings
#[derive(Debug, Clone)]
pub struct AnalyzerSettings {
    pub mode: LibraryMode,
    /// History section name to prefer
    pub library_name: String,
    /// Limit used when the caller passes none
    pub default_limit: usize,
    /// Ceiling for both fan-outs
    pub max_concurrent: usize,
}

/// Finds the largest items that nobody watched recently.
pub struct UnwatchedAnalyzer {
    library: Arc<dyn LibraryManager>,
    history: Arc<dyn HistoryService>,
    settings: AnalyzerSettings,
}

impl UnwatchedAnalyzer {
    pub fn new(
        library: Arc<dyn LibraryManager>,
        history: Arc<dyn HistoryService>,
        settings: AnalyzerSettings,
    ) -> Self {
        Self {
            library,
            history,
            settings,
        }
    }

    pub fn settings(&self) -> &AnalyzerSettings {
        &self.settings
    }

    pub fn resolve_limit(&self, limit: Option<usize>) -> usize {
        limit.unwrap_or(self.settings.default_limit)
    }

    /// Unwatched items among the top `limit` by size, largest first.
    pub async fn find_unwatched(&self, limit: Option<usize>, months: u32) -> Result<AnalysisOutcome> {
        self.find_unwatched_at(limit, months, Utc::now()).await
    }

    /// Same as [`find_unwatched`](Self::find_unwatched) with a fixed clock.
    pub async fn find_unwatched_at(
        &self,
        limit: Option<usize>,
        months: u32,
        now: DateTime<Utc>,
    ) -> Result<AnalysisOutcome> {
        let limit = self.resolve_limit(limit);
        let mode = self.settings.mode;
        info!(
            mode = %mode,
            limit,
            months,
            "Finding largest {} not watched recently",
            mode.plural_label()
        );

        let candidates = SizeRanker::new(self.library.clone(), self.settings.max_concurrent)
            .top_by_size(limit)
            .await?;

        let cutoff = cutoff_epoch(now, months);
        let index = Arc::new(self.load_watch_index(cutoff, months).await);

        let unwatched_flags = self.classify(&candidates, index).await;
        let candidates_checked = candidates.len();

        let mut unwatched: Vec<UnwatchedRecord> = candidates
            .into_iter()
            .zip(unwatched_flags)
            .filter_map(|(item, is_unwatched)| is_unwatched.then(|| to_record(item)))
            .collect();
        unwatched.sort_by(|a, b| b.size_bytes.cmp(&a.size_bytes));

        info!(
            mode = %mode,
            checked = candidates_checked,
            unwatched = unwatched.len(),
            "Analysis complete"
        );

        Ok(AnalysisOutcome {
            unwatched,
            candidates_checked,
        })
    }

    /// Build the shared index; any [`HistoryUnavailable`](crate::error::HistoryUnavailable)
    /// becomes an empty index so every candidate is reported.
    async fn load_watch_index(&self, cutoff: i64, months: u32) -> WatchIndex {
        let section_type = self.settings.mode.section_type();
        match build_watch_index(
            self.history.as_ref(),
            section_type,
            &self.settings.library_name,
            cutoff,
        )
        .await
        {
            Ok(index) => {
                info!(
                    titles = index.len(),
                    months,
                    "Found {} {} watched in the lookback window",
                    index.len(),
                    self.settings.mode.plural_label()
                );
                for (title, plays) in index.most_watched(MOST_WATCHED_LOG_COUNT) {
                    debug!(title = %title, plays, "Most watched");
                }
                index
            }
            Err(e) => {
                warn!(error = %e, "Watch history unavailable, treating every candidate as unwatched");
                WatchIndex::new()
            }
        }
    }

    /// One flag per candidate, index-aligned: `true` means unwatched.
    async fn classify(&self, candidates: &[LibraryItem], index: Arc<WatchIndex>) -> Vec<bool> {
        let total = candidates.len();
        let titles: Vec<(usize, String)> = candidates
            .iter()
            .enumerate()
            .map(|(i, item)| (i, item.title.clone()))
            .collect();

        let results = gather_indexed(titles, self.settings.max_concurrent, move |(position, title)| {
            let index = index.clone();
            async move {
                let decision = find_watch_match(&title, &index);
                match &decision {
                    Some(kind) => debug!(
                        checked = position + 1,
                        total,
                        title = %title,
                        matched = ?kind.matched_key(),
                        "Watched recently"
                    ),
                    None => debug!(checked = position + 1, total, title = %title, "No recent watches"),
                }
                decision.is_none()
            }
        })
        .await;

        results
            .into_iter()
            .zip(candidates)
            .map(|(result, item)| unwatched_or_fallback(result, &item.title))
            .collect()
    }
}

/// The task's decision, or `true` (unwatched) if the match task failed.
fn unwatched_or_fallback(result: std::result::Result<bool, JoinError>, title: &str) -> bool {
    result.unwrap_or_else(|e| {
        let err = AnalyzerError::MatchProcessing {
            title: title.to_string(),
            reason: e.to_string(),
        };
        warn!(error = %err, "Treating candidate as unwatched");
        true
    })
}

/// Report row for an unwatched item.
pub fn to_record(item: LibraryItem) -> UnwatchedRecord {
    UnwatchedRecord {
        id: item.id,
        human_size: format_bytes(item.size_on_disk),
        size_bytes: item.size_on_disk,
        path: item.path.unwrap_or_else(|| UNKNOWN_PATH.to_string()),
        title: item.title,
    }
}
