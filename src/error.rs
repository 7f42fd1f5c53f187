//! Error taxonomy for an analysis run.
//!
//! Only [`AnalyzerError::UpstreamUnavailable`] aborts a run. The others are
//! recovered where they occur and exist so the recovery is visible in the types
//! and in the logs. Configuration problems are reported by
//! [`Config`](crate::config::Config) before a run starts.

use thiserror::Error;

use crate::app_mode::SectionType;

pub type Result<T> = std::result::Result<T, AnalyzerError>;

#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// Inventory could not be fetched. Fatal: ranking needs the full catalog.
    #[error("{service} is unavailable: {reason}")]
    UpstreamUnavailable { service: String, reason: String },

    /// Per-candidate evaluation failed; the candidate is reported as unwatched.
    #[error("failed to evaluate '{title}': {reason}")]
    MatchProcessing { title: String, reason: String },
}

impl AnalyzerError {
    pub fn upstream(service: impl Into<String>, err: impl std::fmt::Display) -> Self {
        AnalyzerError::UpstreamUnavailable {
            service: service.into(),
            reason: format!("{err:#}"),
        }
    }
}

/// Why no watch index could be built. The orchestrator maps every variant to an
/// empty index so all candidates count as unwatched.
#[derive(Debug, Error)]
pub enum HistoryUnavailable {
    #[error("no {section_type} library section found in history service (wanted '{library_name}')")]
    NoMatchingLibrarySection {
        section_type: SectionType,
        library_name: String,
    },

    #[error("history query failed: {0}")]
    QueryFailed(String),
}
