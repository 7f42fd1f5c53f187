//! Upstream clients and the unwatched-item pipeline

pub mod analyzer;
pub mod cleanup;
pub mod fanout;
pub mod file_utils;
pub mod http_client;
pub mod logging;
pub mod ranking;
pub mod report;
pub mod servarr;
pub mod tautulli;
pub mod title_matcher;
pub mod watch_history;

pub use analyzer::{AnalyzerSettings, UnwatchedAnalyzer};
pub use cleanup::{CleanupSummary, interactive_cleanup};
pub use http_client::HttpSession;
pub use logging::{Verbosity, init_tracing};
pub use ranking::SizeRanker;
pub use report::{ReportPaths, ReportWriter};
pub use servarr::{LibraryManager, ServarrClient};
pub use tautulli::{HistoryService, TautulliClient};
pub use title_matcher::{MatchKind, is_recently_watched};
pub use watch_history::WatchIndex;
