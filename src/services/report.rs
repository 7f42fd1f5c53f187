//! JSON and HTML reports of unwatched items

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::info;

use crate::app_mode::LibraryMode;
use crate::models::{AnalysisOutcome, UnwatchedRecord};
use crate::services::file_utils::format_bytes;

/// Paths of one written report pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    pub json: PathBuf,
    pub html: PathBuf,
}

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    report_date: String,
    mode: &'a str,
    unwatched_count: usize,
    months_threshold: u32,
    unwatched_items: &'a [UnwatchedRecord],
}

/// Writes reports into a directory, creating it on first use.
pub struct ReportWriter {
    dir: PathBuf,
}

impl ReportWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn write(&self, mode: LibraryMode, months: u32, outcome: &AnalysisOutcome) -> Result<ReportPaths> {
        self.write_at(mode, months, outcome, Local::now())
    }

    pub fn write_at(
        &self,
        mode: LibraryMode,
        months: u32,
        outcome: &AnalysisOutcome,
        generated: DateTime<Local>,
    ) -> Result<ReportPaths> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create report directory {}", self.dir.display()))?;

        let stem = format!(
            "unwatched_{}_{}",
            mode.service_name(),
            generated.format("%Y-%m-%d_%H-%M-%S")
        );
        let paths = ReportPaths {
            json: self.dir.join(format!("{stem}.json")),
            html: self.dir.join(format!("{stem}.html")),
        };

        let report = JsonReport {
            report_date: generated.to_rfc3339(),
            mode: mode.service_name(),
            unwatched_count: outcome.unwatched.len(),
            months_threshold: months,
            unwatched_items: &outcome.unwatched,
        };
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        fs::write(&paths.json, json)
            .with_context(|| format!("Failed to write {}", paths.json.display()))?;

        let html = render_html(mode, months, &outcome.unwatched, generated);
        fs::write(&paths.html, html)
            .with_context(|| format!("Failed to write {}", paths.html.display()))?;

        info!(json = %paths.json.display(), html = %paths.html.display(), "Report written");
        Ok(paths)
    }
}

/// HTML table of `records`, largest first.
pub fn render_html(
    mode: LibraryMode,
    months: u32,
    records: &[UnwatchedRecord],
    generated: DateTime<Local>,
) -> String {
    let heading = match mode {
        LibraryMode::Series => "Series",
        LibraryMode::Movies => "Movies",
    };
    let total: u64 = records.iter().map(|r| r.size_bytes).sum();

    let mut sorted: Vec<&UnwatchedRecord> = records.iter().collect();
    sorted.sort_by(|a, b| b.size_bytes.cmp(&a.size_bytes));

    let mut html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Unwatched {heading} Report</title>
    <style>
        body {{ font-family: Arial, sans-serif; margin: 20px; }}
        h1 {{ color: #333; }}
        table {{ border-collapse: collapse; width: 100%; margin-top: 20px; }}
        th, td {{ border: 1px solid #ddd; padding: 8px; text-align: left; }}
        th {{ background-color: #f2f2f2; }}
        tr:nth-child(even) {{ background-color: #f9f9f9; }}
        tr:hover {{ background-color: #f5f5f5; }}
        .summary {{ margin-bottom: 20px; }}
    </style>
</head>
<body>
    <h1>Unwatched {heading} Report</h1>
    <div class="summary">
        <p>Report generated on: {generated}</p>
        <p>Found <strong>{count}</strong> {plural} that haven't been watched in <strong>{months}</strong> months.</p>
        <p>Total space that could be freed: <strong>{total}</strong></p>
    </div>
    <table>
        <tr>
            <th>Title</th>
            <th>Size</th>
            <th>Path</th>
        </tr>"#,
        generated = generated.format("%Y-%m-%d %H:%M:%S"),
        count = records.len(),
        plural = mode.plural_label(),
        total = format_bytes(total),
    );

    for record in sorted {
        html.push_str(&format!(
            r#"
        <tr>
            <td>{}</td>
            <td>{}</td>
            <td>{}</td>
        </tr>"#,
            escape_html(&record.title),
            escape_html(&record.human_size),
            escape_html(&record.path),
        ));
    }

    html.push_str(
        r#"
    </table>
</body>
</html>"#,
    );
    html
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
