//! Batch orchestration over all configured channel ranges.
//!
//! [`BatchOrchestrator`] owns the aggregation state for the lifetime of
//! the tool. Each call to [`BatchOrchestrator::run`] updates the
//! bookkeeping, aggregates every effective range, optionally splits each
//! range by channel status and resolves names and titles for the
//! presentation layer.

use super::aggregator::{AxisBounds, RangeAggregator};
use super::lines::line_positions;
use super::state::AggregationState;
use crate::channels::{ChannelRangeCatalog, ChannelStatusClassifier};
use crate::error::BatchError;
use crate::metric::MetricEvaluator;
use crate::models::{
    ChannelRange, ChannelStatus, CombinedResult, EventBatch, Index, PlotSpec, RangeResult,
    RangeTable,
};
use crate::naming::{substitute, uses_status, NameTokens, PadWidths};
use tracing::{debug, info, warn};

/// Range name that selects every channel in the batch.
pub const ALL_RANGES: &str = "all";

/// Key under which all-channels statistics accumulate. The table of each
/// call spans only that batch's channels, which differs between events.
pub fn all_channels_key() -> ChannelRange {
    ChannelRange::new(ALL_RANGES, 0, Index::MAX, "All")
}

/// Settings for one metric, fixed at construction.
#[derive(Debug, Clone)]
pub struct MetricSettings {
    /// Metric name passed to the evaluator.
    pub metric: String,
    /// Channel range names; empty, `"all"` or `""` select all channels.
    pub range_names: Vec<String>,
    /// Metric axis limits; clamping applies only when `min < max`.
    pub metric_min: f32,
    pub metric_max: f32,
    /// Metric axis label; empty means derive from metric name and units.
    pub metric_label: String,
    /// Boundary line spacing and pattern.
    pub line_modulus: Index,
    pub line_pattern: Vec<Index>,
    /// Name and title templates.
    pub hist_name: String,
    pub hist_title: String,
    /// Plot size in pixels.
    pub plot_size_x: u32,
    pub plot_size_y: u32,
    /// Output file name templates (empty = disabled).
    pub plot_file_name: String,
    pub json_file_name: String,
    /// Zero-padding widths for name templates.
    pub widths: PadWidths,
}

impl Default for MetricSettings {
    fn default() -> Self {
        Self {
            metric: "pedestal".to_string(),
            range_names: Vec::new(),
            metric_min: 0.0,
            metric_max: 0.0,
            metric_label: String::new(),
            line_modulus: 0,
            line_pattern: Vec::new(),
            hist_name: "hmet_%CRNAME%_%0RUN%_%0EVENT%".to_string(),
            hist_title: "Run %RUN% event %EVENT% %CRLABEL%".to_string(),
            plot_size_x: 0,
            plot_size_y: 0,
            plot_file_name: String::new(),
            json_file_name: String::new(),
            widths: PadWidths::default(),
        }
    }
}

/// Runs the per-range aggregation for each batch.
pub struct BatchOrchestrator {
    settings: MetricSettings,
    bounds: Option<AxisBounds>,
    use_status: bool,
    all_channels: bool,
    ranges: Vec<ChannelRange>,
    unresolved: Vec<String>,
    evaluator: Box<dyn MetricEvaluator>,
    classifier: Box<dyn ChannelStatusClassifier>,
    state: AggregationState,
}

impl BatchOrchestrator {
    /// Resolves the configured ranges once. Names the catalog does not know
    /// are reported and skipped.
    pub fn new(
        settings: MetricSettings,
        catalog: &dyn ChannelRangeCatalog,
        evaluator: Box<dyn MetricEvaluator>,
        classifier: Box<dyn ChannelStatusClassifier>,
    ) -> Self {
        let all_channels = settings.range_names.is_empty()
            || settings
                .range_names
                .iter()
                .any(|n| n.is_empty() || n == ALL_RANGES);

        let mut ranges = Vec::new();
        let mut unresolved = Vec::new();
        if !all_channels {
            for name in &settings.range_names {
                match catalog.resolve(name) {
                    Ok(range) => ranges.push(range),
                    Err(e) => {
                        warn!("{}; range skipped", e);
                        unresolved.push(name.clone());
                    }
                }
            }
        }

        let bounds = AxisBounds::new(settings.metric_min, settings.metric_max);
        if bounds.is_none() && (settings.metric_min != 0.0 || settings.metric_max != 0.0) {
            warn!(
                "Metric axis [{}, {}] is empty or inverted; values will not be clamped",
                settings.metric_min, settings.metric_max
            );
        }

        let use_status = uses_status(&settings.hist_name);

        info!("Metric: {}", settings.metric);
        if all_channels {
            info!("Channel ranges: all");
        } else {
            let names: Vec<String> = ranges.iter().map(ToString::to_string).collect();
            info!("Channel ranges: {}", names.join(", "));
        }
        if use_status {
            info!("Status split enabled (bad, noisy, good)");
        }

        Self {
            settings,
            bounds,
            use_status,
            all_channels,
            ranges,
            unresolved,
            evaluator,
            classifier,
            state: AggregationState::new(),
        }
    }

    /// Processes one batch. A call that fails leaves the state untouched.
    pub fn run(&mut self, batch: &EventBatch) -> Result<CombinedResult, BatchError> {
        let ranges = self.effective_ranges(batch)?;

        self.state.update(batch.run, batch.event);

        let aggregator = RangeAggregator::new(&self.settings.metric, self.evaluator.as_ref(), self.bounds);
        let all_key = all_channels_key();
        let mut results = Vec::new();

        for range in &ranges {
            let key = if self.all_channels { &all_key } else { range };
            let table = aggregator.aggregate_keyed(range, key, &batch.channels, &mut self.state);
            let lines = line_positions(range, self.settings.line_modulus, &self.settings.line_pattern);

            // Combined table first, then bad, noisy, good.
            let parts = if self.use_status {
                split_by_status(&table, self.classifier.as_ref())
            } else {
                Vec::new()
            };
            results.push(self.named_result(batch, None, table, lines.clone()));
            for (status, sub) in parts {
                results.push(self.named_result(batch, Some(status), sub, lines.clone()));
            }
        }

        let summary = self.state.summary();
        debug!(
            "Run {} event {}: {} results (call {}, {} events, {} runs)",
            batch.run,
            batch.event,
            results.len(),
            summary.call_count,
            summary.event_count,
            summary.run_count
        );

        Ok(CombinedResult {
            run: batch.run,
            subrun: batch.subrun,
            event: batch.event,
            metric: self.settings.metric.clone(),
            results,
            unresolved_ranges: self.unresolved.clone(),
            summary,
        })
    }

    /// Ranges resolved at construction (empty when all channels are used).
    pub fn ranges(&self) -> &[ChannelRange] {
        &self.ranges
    }

    /// Range names the catalog could not resolve.
    pub fn unresolved(&self) -> &[String] {
        &self.unresolved
    }

    pub fn uses_status(&self) -> bool {
        self.use_status
    }

    pub fn settings(&self) -> &MetricSettings {
        &self.settings
    }

    pub fn state(&self) -> &AggregationState {
        &self.state
    }

    fn effective_ranges(&self, batch: &EventBatch) -> Result<Vec<ChannelRange>, BatchError> {
        if self.all_channels {
            let (first, last) = batch.channel_span().ok_or(BatchError::NoRangesConfigured)?;
            return Ok(vec![ChannelRange::new(ALL_RANGES, first, last, "All")]);
        }
        if self.ranges.is_empty() {
            return Err(BatchError::NoValidRanges(self.unresolved.clone()));
        }
        Ok(self.ranges.clone())
    }

    fn named_result(
        &self,
        batch: &EventBatch,
        status: Option<ChannelStatus>,
        table: RangeTable,
        lines: Vec<Index>,
    ) -> RangeResult {
        let mut tokens = NameTokens::new(batch.run, batch.subrun, batch.event, &table.range);
        tokens.status = status;

        let s = &self.settings;
        let resolve = |template: &str| substitute(template, &tokens, &s.widths);
        let optional = |template: &str| {
            if template.is_empty() {
                String::new()
            } else {
                resolve(template)
            }
        };

        let plot = PlotSpec {
            metric_label: self.metric_label(&table.units),
            metric_bounds: self.bounds.map(|b| (b.min(), b.max())),
            size_x: s.plot_size_x,
            size_y: s.plot_size_y,
            plot_file: optional(&s.plot_file_name),
            json_file: optional(&s.json_file_name),
        };
        let name = resolve(&s.hist_name);
        let title = resolve(&s.hist_title);

        RangeResult {
            name,
            title,
            status,
            table,
            lines,
            plot,
        }
    }

    fn metric_label(&self, units: &str) -> String {
        if !self.settings.metric_label.is_empty() {
            self.settings.metric_label.clone()
        } else if units.is_empty() {
            self.settings.metric.clone()
        } else {
            format!("{} [{}]", self.settings.metric, units)
        }
    }
}

fn status_rank(status: ChannelStatus) -> usize {
    ChannelStatus::ALL
        .iter()
        .position(|&s| s == status)
        .unwrap_or(ChannelStatus::ALL.len())
}

/// Partitions a table into bad, noisy and good sub-tables. Every row and
/// every skipped channel lands in exactly one of them.
pub fn split_by_status(
    table: &RangeTable,
    classifier: &dyn ChannelStatusClassifier,
) -> Vec<(ChannelStatus, RangeTable)> {
    let mut parts: Vec<(ChannelStatus, RangeTable)> = ChannelStatus::ALL
        .iter()
        .map(|&status| {
            let mut sub = RangeTable::empty(table.range.clone());
            sub.units = table.units.clone();
            (status, sub)
        })
        .collect();

    for row in &table.rows {
        let rank = status_rank(classifier.classify(row.channel));
        parts[rank].1.push(row.clone());
    }
    for &channel in &table.skipped {
        let rank = status_rank(classifier.classify(channel));
        parts[rank].1.skipped.push(channel);
    }

    parts
}
