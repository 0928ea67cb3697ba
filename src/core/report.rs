//! Self-contained HTML migration report.
//!
//! Generation is a pure function of its inputs: the only time embedded in the document is
//! the run's end time, so rendering the same run twice yields identical output.

use std::fmt::Write;

use chrono::{DateTime, Utc};
use html_escape::encode_text;

use super::models::{
    FolderRecord, LogEntry, LogLevel, MigrationOutcome, RunMetadata, Stat, format_bytes,
    format_duration,
};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

const STYLE: &str = r#"
body { font-family: Segoe UI, Helvetica, Arial, sans-serif; margin: 24px; color: #222; }
h1 { font-size: 22px; margin-bottom: 4px; }
h2 { font-size: 18px; margin-top: 32px; border-bottom: 1px solid #ccc; padding-bottom: 4px; }
.meta { color: #666; font-size: 13px; }
.cards { display: flex; gap: 12px; flex-wrap: wrap; margin-top: 16px; }
.card { border: 1px solid #ddd; border-radius: 6px; padding: 10px 16px; min-width: 120px; }
.card .value { font-size: 22px; font-weight: 600; }
.card .label { font-size: 12px; color: #666; text-transform: uppercase; }
table { border-collapse: collapse; width: 100%; font-size: 13px; }
th, td { border: 1px solid #ddd; padding: 4px 8px; text-align: left; vertical-align: top; }
th { background: #f3f3f3; }
td.num { text-align: right; }
.status-success { color: #1a7f37; font-weight: 600; }
.status-failed { color: #c62828; font-weight: 600; }
.unknown { color: #999; font-style: italic; }
ol.log { font-family: Consolas, monospace; font-size: 12px; padding-left: 0; list-style: none; }
ol.log li { padding: 1px 0; }
.level-info { color: #333; }
.level-warning { color: #b26a00; }
.level-error { color: #c62828; }
.level-success { color: #1a7f37; }
"#;

/// Everything the report is built from.
pub struct ReportInput<'a> {
    pub inventory: &'a [FolderRecord],
    pub outcomes: &'a [MigrationOutcome],
    pub log: &'a [LogEntry],
    pub metadata: &'a RunMetadata,
}

pub fn generate(input: &ReportInput<'_>) -> String {
    let mut doc = String::with_capacity(16 * 1024);

    let title = format!("Folder Migration Report - {}", input.metadata.batch_label);
    let _ = writeln!(doc, "<!DOCTYPE html>");
    let _ = writeln!(doc, "<html lang=\"en\">");
    let _ = writeln!(doc, "<head>");
    let _ = writeln!(doc, "<meta charset=\"utf-8\">");
    let _ = writeln!(doc, "<title>{}</title>", encode_text(&title));
    let _ = writeln!(doc, "<style>{}</style>", STYLE);
    let _ = writeln!(doc, "</head>");
    let _ = writeln!(doc, "<body>");

    write_header(&mut doc, &title, input.metadata);
    write_summary(&mut doc, input);
    write_results(&mut doc, input.outcomes);
    write_inventory(&mut doc, input.inventory);
    write_log(&mut doc, input.log);

    let _ = writeln!(doc, "</body>");
    let _ = writeln!(doc, "</html>");
    doc
}

/// File name the report is saved under: `<batch label>_Report.html`, with characters that
/// are not safe in a file name replaced by `_`.
pub fn file_name(metadata: &RunMetadata) -> String {
    let label: String = metadata
        .batch_label
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{}_Report.html", label)
}

fn write_header(doc: &mut String, title: &str, meta: &RunMetadata) {
    let _ = writeln!(doc, "<h1>{}</h1>", encode_text(title));
    let _ = writeln!(doc, "<div class=\"meta\">");
    let _ = writeln!(doc, "Run ID: {}<br>", meta.run_id);
    let _ = writeln!(doc, "Started: {}<br>", fmt_time(&meta.start_time));
    match &meta.end_time {
        Some(end) => {
            let _ = writeln!(doc, "Generated: {}<br>", fmt_time(end));
        }
        None => {
            let _ = writeln!(doc, "Generated: in progress<br>");
        }
    }
    if let Some(org) = &meta.organization {
        let _ = writeln!(
            doc,
            "Destination: {} ({})<br>",
            encode_text(&org.display_name),
            encode_text(&org.id)
        );
    }
    let _ = writeln!(doc, "</div>");
}

fn write_summary(doc: &mut String, input: &ReportInput<'_>) {
    let succeeded = input.outcomes.iter().filter(|o| o.is_success()).count();
    let failed = input.outcomes.len() - succeeded;
    let items: u64 = input.outcomes.iter().map(|o| o.items_migrated).sum();

    let cards = [
        ("Total folders", input.inventory.len().to_string()),
        ("Successful", succeeded.to_string()),
        ("Failed", failed.to_string()),
        ("Items migrated", items.to_string()),
        ("Duration", format_duration(input.metadata.elapsed())),
        ("Warnings", input.metadata.warning_count.to_string()),
        ("Errors", input.metadata.error_count.to_string()),
    ];

    let _ = writeln!(doc, "<h2>Summary</h2>");
    let _ = writeln!(doc, "<div class=\"cards\" id=\"summary\">");
    for (label, value) in cards {
        let _ = writeln!(
            doc,
            "<div class=\"card\"><div class=\"value\">{}</div><div class=\"label\">{}</div></div>",
            encode_text(&value),
            label
        );
    }
    let _ = writeln!(doc, "</div>");
}

fn write_results(doc: &mut String, outcomes: &[MigrationOutcome]) {
    let _ = writeln!(doc, "<h2>Migration Results</h2>");
    let _ = writeln!(doc, "<table id=\"results\">");
    let _ = writeln!(
        doc,
        "<tr><th>#</th><th>Folder</th><th>Status</th><th>Items Migrated</th><th>Error</th><th>Timestamp</th></tr>"
    );
    for (i, outcome) in outcomes.iter().enumerate() {
        let class = if outcome.is_success() {
            "status-success"
        } else {
            "status-failed"
        };
        let _ = writeln!(
            doc,
            "<tr class=\"result-row\"><td class=\"num\">{}</td><td>{}</td><td class=\"{}\">{}</td><td class=\"num\">{}</td><td>{}</td><td>{}</td></tr>",
            i + 1,
            encode_text(&outcome.folder_name),
            class,
            outcome.status,
            outcome.items_migrated,
            encode_text(&outcome.error_message),
            fmt_time(&outcome.timestamp)
        );
    }
    let _ = writeln!(doc, "</table>");
}

fn write_inventory(doc: &mut String, inventory: &[FolderRecord]) {
    let _ = writeln!(doc, "<h2>Folder Inventory</h2>");
    let _ = writeln!(doc, "<table id=\"inventory\">");
    let _ = writeln!(
        doc,
        "<tr><th>Name</th><th>Parent Path</th><th>Items</th><th>Size</th><th>Last Modified</th><th>Subfolders</th><th>Mail Enabled</th><th>Identity</th></tr>"
    );
    for folder in inventory {
        let _ = writeln!(
            doc,
            "<tr class=\"inventory-row\"><td>{}</td><td>{}</td><td class=\"num\">{}</td><td class=\"num\">{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            encode_text(&folder.name),
            encode_text(&folder.parent_path),
            stat_cell(&folder.item_count, |n| n.to_string()),
            stat_cell(&folder.total_size, |n| format_bytes(*n)),
            stat_cell(&folder.last_modified, fmt_time),
            yes_no(folder.has_subfolders),
            yes_no(folder.mail_enabled),
            encode_text(&folder.identity)
        );
    }
    let _ = writeln!(doc, "</table>");
}

fn write_log(doc: &mut String, log: &[LogEntry]) {
    let _ = writeln!(doc, "<h2>Migration Log</h2>");
    let _ = writeln!(doc, "<ol class=\"log\" id=\"log\">");
    for entry in log {
        let _ = writeln!(
            doc,
            "<li class=\"log-entry {}\">[{}] [{}] {}</li>",
            level_class(entry.level),
            fmt_time(&entry.timestamp),
            entry.level,
            encode_text(&entry.message)
        );
    }
    let _ = writeln!(doc, "</ol>");
}

fn stat_cell<T>(stat: &Stat<T>, fmt: impl Fn(&T) -> String) -> String {
    match stat {
        Stat::Known(v) => encode_text(&fmt(v)).into_owned(),
        Stat::Unknown => "<span class=\"unknown\">Unknown</span>".to_string(),
    }
}

fn level_class(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Info => "level-info",
        LogLevel::Warning => "level-warning",
        LogLevel::Error => "level-error",
        LogLevel::Success => "level-success",
    }
}

fn yes_no(value: bool) -> &'static str {
    if value { "Yes" } else { "No" }
}

fn fmt_time(time: &DateTime<Utc>) -> String {
    time.format(TIME_FORMAT).to_string()
}
