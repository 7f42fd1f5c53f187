//! Command-line options.

use std::path::PathBuf;

use clap::Parser;

use crate::app_mode::LibraryMode;
use crate::services::logging::Verbosity;

#[derive(Debug, Parser)]
#[command(name = "reclaimarr")]
#[command(
    about = "Find the largest Sonarr/Radarr items nobody has watched recently in Tautulli",
    long_about = None
)]
pub struct Cli {
    /// Path to a .env file with the service settings
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Limit to the top N items by size
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Check whether items were watched in the past N months (30-day months)
    #[arg(short, long, default_value_t = 2)]
    pub months: u32,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Log every upstream request and response
    #[arg(short, long)]
    pub debug: bool,

    /// Interactively delete unwatched items instead of writing a report
    #[arg(short, long)]
    pub tui: bool,

    /// Delete files from disk when removing items (only with --tui)
    #[arg(long)]
    pub delete_files: bool,

    /// Library to analyze
    #[arg(long, value_enum, default_value_t = LibraryMode::Series)]
    pub mode: LibraryMode,

    /// Directory for reports (overrides REPORT_PATH)
    #[arg(long)]
    pub report_dir: Option<PathBuf>,
}

impl Cli {
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.verbose, self.debug)
    }
}
