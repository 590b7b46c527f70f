//! Markdown and JSON output of aggregated results.
//!
//! Each result carries resolved plot and JSON file names. Results that
//! resolve to the same file are written together; an existing file with
//! that name is replaced.

use crate::models::{CombinedResult, Index, MetricRow, RangeResult, RunSummary};
use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Width of the text bars drawn for the cumulative mean.
const BAR_WIDTH: usize = 30;

/// Generate the Markdown "plot" for a group of results.
pub fn generate_markdown_report(batch: &CombinedResult, results: &[&RangeResult]) -> String {
    let mut output = String::new();

    output.push_str(&format!("# Channel metric: {}\n\n", batch.metric));
    output.push_str(&generate_metadata_section(batch));

    for result in results {
        output.push_str(&generate_result_section(result));
    }

    if !batch.unresolved_ranges.is_empty() {
        output.push_str("## Unresolved Channel Ranges\n\n");
        for name in &batch.unresolved_ranges {
            output.push_str(&format!("- `{}`\n", name));
        }
        output.push('\n');
    }

    output.push_str(&generate_footer());
    output
}

/// Generate the metadata section.
fn generate_metadata_section(batch: &CombinedResult) -> String {
    let mut section = String::new();
    let s = &batch.summary;

    section.push_str("## Metadata\n\n");
    section.push_str(&format!(
        "- **Run:** {} / subrun {} / event {}\n",
        batch.run, batch.subrun, batch.event
    ));
    section.push_str(&format!(
        "- **Accumulated:** {} calls, {} events, {} runs\n",
        s.call_count, s.event_count, s.run_count
    ));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push('\n');

    section
}

/// Generate the section for one range or status partition.
fn generate_result_section(result: &RangeResult) -> String {
    let mut section = String::new();
    let table = &result.table;
    let plot = &result.plot;

    section.push_str(&format!("## {}\n\n", result.title));
    section.push_str(&format!("*Name: `{}`", result.name));
    if let Some(status) = result.status {
        section.push_str(&format!(" | Status: {}", status));
    }
    section.push_str(&format!(
        " | Channels: {}-{} | Metric: {}*\n\n",
        table.range.first, table.range.last, plot.metric_label
    ));

    if plot.size_x > 0 && plot.size_y > 0 {
        section.push_str(&format!("Plot size: {}x{} px\n\n", plot.size_x, plot.size_y));
    }

    if table.rows.is_empty() {
        section.push_str("No channel values.\n\n");
    } else {
        section.push_str(&format!(
            "This event: {} channels, mean {:.3}, rms {:.3}\n\n",
            table.summary.count(),
            table.summary.mean(),
            table.summary.rms()
        ));
        section.push_str(&generate_rows_table(&table.rows, &result.lines, plot.metric_bounds));
    }

    if !table.skipped.is_empty() {
        let skipped: Vec<String> = table.skipped.iter().map(ToString::to_string).collect();
        section.push_str(&format!("**No value for channels:** {}\n\n", skipped.join(", ")));
    }

    if !result.lines.is_empty() {
        let lines: Vec<String> = result.lines.iter().map(ToString::to_string).collect();
        section.push_str(&format!("**Boundary lines at:** {}\n\n", lines.join(", ")));
    }

    section
}

/// Channel table with a text bar for the cumulative mean.
fn generate_rows_table(rows: &[MetricRow], lines: &[Index], bounds: Option<(f32, f32)>) -> String {
    let mut table = String::new();
    let line_set: HashSet<Index> = lines.iter().copied().collect();

    let (lo, hi) = bounds
        .map(|(lo, hi)| (lo as f64, hi as f64))
        .unwrap_or_else(|| value_range(rows));

    table.push_str("| Channel | Value | Clamped | N | Mean | Error | |\n");
    table.push_str("|---:|---:|---:|---:|---:|---:|:---|\n");
    for row in rows {
        let marker = if line_set.contains(&row.channel) { "▶ " } else { "" };
        table.push_str(&format!(
            "| {}{} | {:.3} | {:.3} | {} | {:.3} | {:.3} | `{}` |\n",
            marker,
            row.channel,
            row.raw_value,
            row.value,
            row.count,
            row.mean,
            row.stderr,
            bar(row.mean, lo, hi)
        ));
    }
    table.push('\n');

    table
}

fn value_range(rows: &[MetricRow]) -> (f64, f64) {
    let lo = rows.iter().map(|r| r.mean).fold(f64::INFINITY, f64::min);
    let hi = rows.iter().map(|r| r.mean).fold(f64::NEG_INFINITY, f64::max);
    (lo, hi)
}

fn bar(value: f64, lo: f64, hi: f64) -> String {
    let frac = if hi > lo { ((value - lo) / (hi - lo)).clamp(0.0, 1.0) } else { 1.0 };
    let filled = (frac * BAR_WIDTH as f64).round() as usize;
    format!("{}{}", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(&format!("*Generated by chanmetric v{}*\n", env!("CARGO_PKG_VERSION")));

    footer
}

#[derive(Serialize)]
struct JsonReport<'a> {
    run: Index,
    subrun: Index,
    event: Index,
    metric: &'a str,
    summary: &'a RunSummary,
    unresolved_ranges: &'a [String],
    results: &'a [&'a RangeResult],
}

/// Generate a JSON report for a group of results.
pub fn generate_json_report(batch: &CombinedResult, results: &[&RangeResult]) -> Result<String> {
    let report = JsonReport {
        run: batch.run,
        subrun: batch.subrun,
        event: batch.event,
        metric: &batch.metric,
        summary: &batch.summary,
        unresolved_ranges: &batch.unresolved_ranges,
        results,
    };
    serde_json::to_string_pretty(&report).map_err(Into::into)
}

/// Write all plot and JSON files named by the results of one batch.
///
/// Returns the paths written.
pub fn write_outputs(batch: &CombinedResult, dir: &Path) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    for (file, results) in group_by_file(&batch.results, |r| &r.plot.plot_file) {
        let path = dir.join(&file);
        let content = generate_markdown_report(batch, &results);
        write_file(&path, &content)?;
        written.push(path);
    }

    for (file, results) in group_by_file(&batch.results, |r| &r.plot.json_file) {
        let path = dir.join(&file);
        let content = generate_json_report(batch, &results)?;
        write_file(&path, &content)?;
        written.push(path);
    }

    Ok(written)
}

fn group_by_file<'a>(
    results: &'a [RangeResult],
    file: impl Fn(&RangeResult) -> &String,
) -> BTreeMap<String, Vec<&'a RangeResult>> {
    let mut grouped: BTreeMap<String, Vec<&RangeResult>> = BTreeMap::new();
    for result in results {
        let name = file(result);
        if !name.is_empty() {
            grouped.entry(name.clone()).or_default().push(result);
        }
    }
    grouped
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
    }
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    debug!("Wrote {}", path.display());
    Ok(())
}

/// Text summary of the accumulated bookkeeping.
pub fn generate_summary_text(summary: &RunSummary) -> String {
    let mut lines = Vec::new();

    lines.push(format!("Calls: {}", summary.call_count));
    lines.push(format!(
        "Runs: {} ({} to {})",
        summary.run_count, summary.first_run, summary.last_run
    ));
    lines.push(format!(
        "Events: {} ({} to {})",
        summary.event_count, summary.first_event, summary.last_event
    ));

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChannelRange, ChannelStatus, PlotSpec, RangeTable};

    fn create_test_result(status: Option<ChannelStatus>, plot_file: &str) -> RangeResult {
        let mut table = RangeTable::empty(ChannelRange::new("apa1", 0, 3, "APA 1"));
        table.units = "ADC count".to_string();
        for (ch, v) in [(0, 100.0), (1, 110.0)] {
            table.push(MetricRow {
                channel: ch,
                raw_value: v,
                value: v,
                count: 1,
                mean: v as f64,
                stderr: 0.0,
            });
        }
        table.skipped.push(2);

        RangeResult {
            name: "hmet_apa1".to_string(),
            title: "Pedestals for APA 1".to_string(),
            status,
            table,
            lines: vec![0],
            plot: PlotSpec {
                metric_label: "pedestal [ADC count]".to_string(),
                metric_bounds: Some((90.0, 110.0)),
                size_x: 1400,
                size_y: 500,
                plot_file: plot_file.to_string(),
                json_file: String::new(),
            },
        }
    }

    fn create_test_batch(results: Vec<RangeResult>) -> CombinedResult {
        CombinedResult {
            run: 42,
            subrun: 1,
            event: 7,
            metric: "pedestal".to_string(),
            results,
            unresolved_ranges: vec!["apa9".to_string()],
            summary: RunSummary {
                call_count: 3,
                first_run: 42,
                last_run: 42,
                first_event: 5,
                last_event: 7,
                event_count: 3,
                run_count: 1,
            },
        }
    }

    #[test]
    fn test_generate_markdown_report() {
        let batch = create_test_batch(vec![create_test_result(None, "p.md")]);
        let refs: Vec<&RangeResult> = batch.results.iter().collect();
        let markdown = generate_markdown_report(&batch, &refs);

        assert!(markdown.contains("# Channel metric: pedestal"));
        assert!(markdown.contains("## Pedestals for APA 1"));
        assert!(markdown.contains("pedestal [ADC count]"));
        assert!(markdown.contains("Plot size: 1400x500 px"));
        assert!(markdown.contains("**No value for channels:** 2"));
        assert!(markdown.contains("▶ 0"));
        assert!(markdown.contains("`apa9`"));
    }

    #[test]
    fn test_bar_scaling() {
        assert_eq!(bar(90.0, 90.0, 110.0), ".".repeat(BAR_WIDTH));
        assert_eq!(bar(200.0, 90.0, 110.0), "#".repeat(BAR_WIDTH));
        assert_eq!(bar(5.0, 5.0, 5.0), "#".repeat(BAR_WIDTH));
    }

    #[test]
    fn test_generate_json_report() {
        let batch = create_test_batch(vec![create_test_result(Some(ChannelStatus::Good), "p.md")]);
        let refs: Vec<&RangeResult> = batch.results.iter().collect();
        let json = generate_json_report(&batch, &refs).unwrap();

        assert!(json.contains("\"metric\": \"pedestal\""));
        assert!(json.contains("\"status\": \"good\""));
        assert!(json.contains("\"results\""));
    }

    #[test]
    fn test_write_outputs_groups_by_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut json_result = create_test_result(Some(ChannelStatus::Bad), "plots/one.md");
        json_result.plot.json_file = "out.json".to_string();
        let batch = create_test_batch(vec![
            create_test_result(None, "plots/one.md"),
            json_result,
            create_test_result(None, ""),
        ]);

        let written = write_outputs(&batch, dir.path()).unwrap();
        assert_eq!(written.len(), 2);

        let markdown = std::fs::read_to_string(dir.path().join("plots/one.md")).unwrap();
        assert_eq!(markdown.matches("## Pedestals for APA 1").count(), 2);
        assert!(dir.path().join("out.json").exists());
    }

    #[test]
    fn test_summary_text() {
        let text = generate_summary_text(&create_test_batch(Vec::new()).summary);
        assert!(text.contains("Calls: 3"));
        assert!(text.contains("Events: 3 (5 to 7)"));
    }
}
