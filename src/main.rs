//! reclaimarr - report or delete the largest unwatched library items
//!
//! Configuration comes from the environment (optionally a `.env` file);
//! the mode and run options come from the command line.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::warn;

use reclaimarr::cli::Cli;
use reclaimarr::config::Config;
use reclaimarr::services::file_utils::format_bytes;
use reclaimarr::services::{
    AnalyzerSettings, HistoryService, HttpSession, LibraryManager, ReportWriter, ServarrClient,
    TautulliClient, UnwatchedAnalyzer, init_tracing, interactive_cleanup,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.config {
        Some(path) => {
            dotenvy::from_path(path)
                .with_context(|| format!("Failed to load config file {}", path.display()))?;
        }
        None => {
            dotenvy::dotenv().ok();
        }
    }

    init_tracing(cli.verbosity());

    let mut config = Config::from_env()?;
    if let Some(dir) = &cli.report_dir {
        config.report_path = dir.clone();
    }

    let session = HttpSession::new(&config)?;
    let result = run(&cli, &config, &session).await;
    session.close();
    result
}

async fn run(cli: &Cli, config: &Config, session: &HttpSession) -> Result<()> {
    let mode = cli.mode;
    let manager = config.library_manager(mode)?;

    let library: Arc<dyn LibraryManager> =
        Arc::new(ServarrClient::new(session, mode, &manager.endpoint));
    let history: Arc<dyn HistoryService> = Arc::new(TautulliClient::new(session, &config.tautulli));

    let analyzer = UnwatchedAnalyzer::new(
        library.clone(),
        history,
        AnalyzerSettings {
            mode,
            library_name: config.library_name(mode).to_string(),
            default_limit: manager.default_limit,
            max_concurrent: config.max_concurrent_requests,
        },
    );

    println!(
        "Finding top {} {} by size that haven't been watched in {} months...",
        analyzer.resolve_limit(cli.limit),
        mode.plural_label(),
        cli.months
    );

    let outcome = analyzer.find_unwatched(cli.limit, cli.months).await?;

    if cli.tui {
        let stdin = std::io::stdin();
        interactive_cleanup(
            library.as_ref(),
            mode,
            &outcome.unwatched,
            cli.months,
            cli.delete_files,
            stdin.lock(),
            std::io::stdout(),
        )
        .await?;
        return Ok(());
    }

    if cli.delete_files {
        warn!("--delete-files has no effect without --tui");
    }

    let paths = ReportWriter::new(&config.report_path).write(mode, cli.months, &outcome)?;

    println!("\nReport generated:");
    println!("- JSON: {}", paths.json.display());
    println!("- HTML: {}", paths.html.display());
    println!(
        "\nChecked {} {}. Found {} that haven't been watched in {} months.",
        outcome.candidates_checked,
        mode.plural_label(),
        outcome.unwatched.len(),
        cli.months
    );
    println!(
        "Total space that could be freed: {}",
        format_bytes(outcome.total_reclaimable_bytes())
    );

    Ok(())
}
