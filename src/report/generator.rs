//! Markdown and JSON report generation.
//!
//! This module renders a fetched snapshot into the report formats the
//! presentation layer hands to the user: a Markdown document with an ASCII
//! bar chart, or a JSON document for downstream tooling. Numeric rounding
//! (two decimal places) happens here, not in the aggregator.

use crate::analysis::top_records;
use crate::config::ReportConfig;
use crate::models::{Histogram, Snapshot, SummaryStats};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(
    snapshot: &Snapshot,
    api_base: &str,
    config: &ReportConfig,
) -> String {
    let mut output = String::new();

    // Title
    output.push_str("# Statements per Paper — Histogram\n\n");

    // Metadata section
    output.push_str(&generate_metadata_section(snapshot, api_base));

    // Summary section
    output.push_str(&generate_summary_section(snapshot));

    // Histogram section
    output.push_str(&generate_histogram_section(&snapshot.histogram, config));

    // Top papers
    output.push_str(&generate_top_papers_section(snapshot, config.top_papers));

    // Footer
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(snapshot: &Snapshot, api_base: &str) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Data Source:** {}\n", api_base));
    section.push_str(&format!(
        "- **Fetch Date:** {}\n",
        snapshot.fetched_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Pages Fetched:** {}\n", snapshot.pages_fetched));
    section.push_str(&format!("- **Records:** {}\n", snapshot.records.len()));
    section.push_str(&format!(
        "- **Fetch Duration:** {:.1}s\n",
        snapshot.duration_seconds
    ));
    section.push_str("\n");

    section
}

/// Generate the summary section.
fn generate_summary_section(snapshot: &Snapshot) -> String {
    let mut section = String::new();

    section.push_str("## Summary\n\n");
    section.push_str("| Papers | Avg Statements | Median Statements |\n");
    section.push_str("|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {:.2} | {:.2} |\n\n",
        snapshot.records.len(),
        snapshot.stats.mean,
        snapshot.stats.median
    ));

    section
}

/// Generate the histogram section: a table plus an optional ASCII chart.
fn generate_histogram_section(histogram: &Histogram, config: &ReportConfig) -> String {
    let mut section = String::new();

    section.push_str("## Distribution of Statements per Paper\n\n");
    section.push_str("| Statements | Papers |\n");
    section.push_str("|:---|:---:|\n");

    for (label, count) in histogram
        .bucket_labels
        .iter()
        .zip(histogram.bucket_counts.iter())
    {
        section.push_str(&format!("| {} | {} |\n", label, count));
    }
    section.push_str(&format!("| **Total** | **{}** |\n\n", histogram.total()));

    if config.include_chart {
        section.push_str("```text\n");
        section.push_str(&ascii_bar_chart(histogram, config.chart_width));
        section.push_str("```\n\n");
    }

    section
}

/// Render the histogram as horizontal bars, scaled to `width` characters.
///
/// Any non-empty bucket gets at least one block so small buckets stay
/// visible next to large ones.
fn ascii_bar_chart(histogram: &Histogram, width: usize) -> String {
    let mut chart = String::new();

    let max_count = histogram.bucket_counts.iter().copied().max().unwrap_or(0);
    let label_width = histogram
        .bucket_labels
        .iter()
        .map(|l| l.chars().count())
        .max()
        .unwrap_or(0);

    for (label, &count) in histogram
        .bucket_labels
        .iter()
        .zip(histogram.bucket_counts.iter())
    {
        let bar_len = if max_count == 0 || count == 0 {
            0
        } else {
            (((count as f64 / max_count as f64) * width as f64).round() as usize).max(1)
        };

        let padding = label_width - label.chars().count();
        chart.push_str(&format!(
            "{}{} | {} {}\n",
            label,
            " ".repeat(padding),
            "█".repeat(bar_len),
            count
        ));
    }

    chart
}

/// Generate the top-papers section.
fn generate_top_papers_section(snapshot: &Snapshot, limit: usize) -> String {
    let top = top_records(&snapshot.records, limit);
    if top.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Top Papers by Statement Count\n\n");
    section.push_str("| # | Paper | Statements |\n");
    section.push_str("|:---:|:---|:---:|\n");

    for (i, record) in top.iter().enumerate() {
        let name = if record.title.is_empty() {
            record.id.as_str()
        } else {
            record.title.as_str()
        };
        section.push_str(&format!("| {} | {} | {} |\n", i + 1, name, record.count));
    }
    section.push_str("\n");

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str("*Report generated by Statdash*\n");

    footer
}

/// JSON report shape for downstream tooling.
#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    api_base: &'a str,
    fetched_at: DateTime<Utc>,
    pages_fetched: u32,
    duration_seconds: f64,
    record_count: usize,
    stats: &'a SummaryStats,
    histogram: &'a Histogram,
}

/// Generate a JSON report.
pub fn generate_json_report(snapshot: &Snapshot, api_base: &str) -> Result<String> {
    let report = JsonReport {
        api_base,
        fetched_at: snapshot.fetched_at,
        pages_fetched: snapshot.pages_fetched,
        duration_seconds: snapshot.duration_seconds,
        record_count: snapshot.records.len(),
        stats: &snapshot.stats,
        histogram: &snapshot.histogram,
    };

    serde_json::to_string_pretty(&report).map_err(Into::into)
}

/// Write a rendered report to a file.
pub fn write_report(path: &Path, contents: &str) -> Result<()> {
    let mut file = std::fs::File::create(path)?;
    file.write_all(contents.as_bytes())?;

    Ok(())
}
