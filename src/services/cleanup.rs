//! Interactive deletion of unwatched items
//!
//! Walks the unwatched list and asks for confirmation before each delete.
//! Nothing is removed without an explicit yes.

use std::io::{BufRead, Write};

use anyhow::Result;
use tracing::{info, warn};

use crate::app_mode::LibraryMode;
use crate::models::UnwatchedRecord;
use crate::services::file_utils::format_bytes;
use crate::services::servarr::LibraryManager;

/// Outcome of an interactive session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupSummary {
    pub deleted: usize,
    pub failed: usize,
    pub skipped: usize,
    pub freed_bytes: u64,
}

enum Answer {
    Yes,
    No,
    EndOfInput,
}

/// Prompt for each record and delete the confirmed ones.
///
/// End of input stops the session; remaining items are left alone. Reads from
/// `input` block the calling task, which is fine here: the analysis has
/// finished and nothing else runs on the runtime while prompting.
pub async fn interactive_cleanup<R, W>(
    library: &dyn LibraryManager,
    mode: LibraryMode,
    records: &[UnwatchedRecord],
    months: u32,
    delete_files: bool,
    mut input: R,
    mut output: W,
) -> Result<CleanupSummary>
where
    R: BufRead,
    W: Write,
{
    let mut summary = CleanupSummary::default();
    let plural = mode.plural_label();
    let singular = mode.item_label();

    if records.is_empty() {
        writeln!(output, "\nNo unwatched {plural} found!")?;
        return Ok(summary);
    }

    let total: u64 = records.iter().map(|r| r.size_bytes).sum();
    writeln!(
        output,
        "\nFound {} {plural} that haven't been watched in {months} months.",
        records.len()
    )?;
    writeln!(output, "Total space that could be freed: {}", format_bytes(total))?;
    writeln!(
        output,
        "\nInteractive deletion mode. For each {singular}, you'll be asked if you want to delete it."
    )?;
    writeln!(
        output,
        "Delete files option is {}",
        if delete_files { "ENABLED" } else { "DISABLED" }
    )?;
    writeln!(output, "\nPress Enter to continue or Ctrl+C to abort...")?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        writeln!(output, "\nNo input, nothing deleted.")?;
        return Ok(summary);
    }

    for (idx, record) in records.iter().enumerate() {
        writeln!(output, "\n[{}/{}] {}", idx + 1, records.len(), record.title)?;
        writeln!(output, "Size: {}", record.human_size)?;
        writeln!(output, "Path: {}", record.path)?;

        match ask(&mut input, &mut output, singular)? {
            Answer::Yes => {
                writeln!(output, "Deleting {}...", record.title)?;
                match library.delete_item(record.id, delete_files).await {
                    Ok(()) => {
                        writeln!(output, "Successfully deleted {}", record.title)?;
                        info!(item_id = record.id, title = %record.title, "Deleted item");
                        summary.deleted += 1;
                        summary.freed_bytes += record.size_bytes;
                    }
                    Err(e) => {
                        writeln!(output, "Failed to delete {}", record.title)?;
                        warn!(item_id = record.id, title = %record.title, error = %format!("{e:#}"), "Delete failed");
                        summary.failed += 1;
                    }
                }
            }
            Answer::No => {
                writeln!(output, "Skipping {}", record.title)?;
                summary.skipped += 1;
            }
            Answer::EndOfInput => {
                writeln!(output, "\nInput closed, stopping.")?;
                break;
            }
        }
    }

    writeln!(output, "\nDeletion complete. Deleted {} {plural}.", summary.deleted)?;
    writeln!(output, "Freed space: {}", format_bytes(summary.freed_bytes))?;
    output.flush()?;
    Ok(summary)
}

fn ask<R: BufRead, W: Write>(input: &mut R, output: &mut W, singular: &str) -> Result<Answer> {
    loop {
        write!(output, "Delete this {singular}? [y/n]: ")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(Answer::EndOfInput);
        }
        match line.trim().to_lowercase().as_str() {
            "y" | "yes" => return Ok(Answer::Yes),
            "n" | "no" => return Ok(Answer::No),
            _ => writeln!(output, "Please enter 'y' or 'n'")?,
        }
    }
}
