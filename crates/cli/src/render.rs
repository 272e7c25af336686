//! Plain-text rendering of comparison outcomes and metadata records.

use chrono::SecondsFormat;
use dupecheck_core::models::{ComparisonReport, FileMetadata, Verdict};
use dupecheck_core::CompareOutcome;
use std::fmt::Write as _;

pub const ABSENT: &str = "N/A";
const MAX_CELL: usize = 64;

/// Collapses multi-line values (EXIF JSON) and truncates long ones.
fn cell(value: Option<&str>) -> String {
    let Some(value) = value else {
        return ABSENT.to_string();
    };
    let flat = value
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if flat.chars().count() > MAX_CELL {
        let head: String = flat.chars().take(MAX_CELL - 3).collect();
        format!("{}...", head)
    } else {
        flat
    }
}

pub fn render_report(report: &ComparisonReport) -> String {
    let table: Vec<(bool, String, String, String)> = report
        .rows
        .iter()
        .map(|r| {
            (
                r.similar,
                r.attribute.clone(),
                cell(r.value_a.as_deref()),
                cell(r.value_b.as_deref()),
            )
        })
        .collect();

    let w_attr = table
        .iter()
        .map(|r| r.1.chars().count())
        .max()
        .unwrap_or(0)
        .max("Attribute".len());
    let w_a = table
        .iter()
        .map(|r| r.2.chars().count())
        .max()
        .unwrap_or(0)
        .max("File A".len());

    let mut out = String::new();
    let _ = writeln!(out, "  {:<w_attr$} | {:<w_a$} | File B", "Attribute", "File A");
    let _ = writeln!(out, "  {}-+-{}-+-{}", "-".repeat(w_attr), "-".repeat(w_a), "-".repeat(6));
    for (similar, attr, a, b) in &table {
        let marker = if *similar { '*' } else { ' ' };
        let _ = writeln!(out, "{} {:<w_attr$} | {:<w_a$} | {}", marker, attr, a, b);
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "Duplication probability: {:.1}%", report.score);

    match report.verdict {
        Verdict::NoIndicators => {
            let _ = writeln!(out, "{}", report.verdict);
        }
        Verdict::IndicatorsFound => {
            let _ = writeln!(out, "Warnings:");
            for w in &report.warnings {
                let _ = writeln!(out, "  - {}", w);
            }
        }
    }
    out
}

pub fn render_outcome(outcome: &CompareOutcome) -> String {
    let mut out = String::new();
    if let Some(notice) = &outcome.notice {
        let _ = writeln!(out, "Notice: {}", notice);
        let _ = writeln!(out);
    }
    out.push_str(&render_report(&outcome.report));
    out
}

pub fn render_metadata(meta: &FileMetadata) -> String {
    let ts = |t: &Option<chrono::DateTime<chrono::Utc>>| {
        t.map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
            .unwrap_or_else(|| ABSENT.to_string())
    };
    let mut out = String::new();
    let _ = writeln!(out, "name:      {}", meta.name);
    let _ = writeln!(out, "size:      {}", meta.size);
    let _ = writeln!(
        out,
        "type:      {}",
        meta.content_type.as_deref().unwrap_or(ABSENT)
    );
    let _ = writeln!(out, "created:   {}", ts(&meta.created_at));
    let _ = writeln!(out, "modified:  {}", ts(&meta.modified_at));
    let _ = writeln!(out, "hash:      {}", meta.content_hash);
    match &meta.exif {
        Some(tags) => {
            let _ = writeln!(out, "exif:      {} tags", tags.len());
            for (k, v) in tags {
                let _ = writeln!(out, "  {}: {}", k, v);
            }
        }
        None => {
            let _ = writeln!(out, "exif:      {}", ABSENT);
        }
    }
    out
}
