//! Data models for the channel metric tool.
//!
//! This module contains the core data structures shared by the metric
//! evaluators, the aggregation engine and the report generator: channel
//! ranges, per-channel readout records, event batches and the tabular
//! results handed to presentation.

use crate::analysis::stats::RunningStat;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

/// Channel index in the detector readout.
pub type Index = u32;

/// A named, labeled, contiguous inclusive span of channels.
///
/// Equality and ordering use the bounds and the name only; the label is
/// display text and two ranges differing only in label are the same key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelRange {
    /// Range name (e.g. "apa1u").
    pub name: String,
    /// First channel in the range.
    pub first: Index,
    /// Last channel in the range (inclusive).
    pub last: Index,
    /// Human-readable label (e.g. "APA 1 u").
    #[serde(default)]
    pub label: String,
}

impl ChannelRange {
    /// Creates a new channel range.
    pub fn new(name: impl Into<String>, first: Index, last: Index, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            first,
            last,
            label: label.into(),
        }
    }

    /// Number of channels in the range.
    pub fn width(&self) -> usize {
        if self.last < self.first {
            return 0;
        }
        (self.last - self.first) as usize + 1
    }

    /// Whether the channel lies within the range.
    pub fn contains(&self, channel: Index) -> bool {
        channel >= self.first && channel <= self.last
    }

    fn key(&self) -> (Index, Index, &str) {
        (self.first, self.last, self.name.as_str())
    }
}

impl PartialEq for ChannelRange {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for ChannelRange {}

impl PartialOrd for ChannelRange {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ChannelRange {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl fmt::Display for ChannelRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}, {}]", self.name, self.first, self.last)
    }
}

/// Readout data for a single channel in one event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelRecord {
    /// Global channel index.
    pub channel: Index,
    /// Pedestal estimate in ADC counts.
    #[serde(default)]
    pub pedestal: f32,
    /// Noise estimate (pedestal RMS) in ADC counts.
    #[serde(default)]
    pub pedestal_rms: f32,
    /// Raw ADC samples.
    #[serde(default)]
    pub raw: Vec<i16>,
    /// Open-ended numeric metadata.
    #[serde(default)]
    pub metadata: HashMap<String, f32>,
}

impl ChannelRecord {
    /// Creates a record with only a channel index and pedestal.
    pub fn with_pedestal(channel: Index, pedestal: f32) -> Self {
        Self {
            channel,
            pedestal,
            ..Self::default()
        }
    }
}

/// One batch of channel records, typically one recorded event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventBatch {
    /// Run number.
    #[serde(default)]
    pub run: Index,
    /// Subrun number.
    #[serde(default)]
    pub subrun: Index,
    /// Event number.
    #[serde(default)]
    pub event: Index,
    /// Channel records for this event.
    #[serde(default)]
    pub channels: Vec<ChannelRecord>,
}

impl EventBatch {
    /// Lowest and highest channel present in the batch.
    pub fn channel_span(&self) -> Option<(Index, Index)> {
        let first = self.channels.iter().map(|c| c.channel).min()?;
        let last = self.channels.iter().map(|c| c.channel).max()?;
        Some((first, last))
    }
}

/// A metric value with its units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricValue {
    pub value: f32,
    pub units: String,
}

impl MetricValue {
    pub fn new(value: f32, units: impl Into<String>) -> Self {
        Self {
            value,
            units: units.into(),
        }
    }

    /// A value without units (indices, fractions, metadata fields).
    pub fn unitless(value: f32) -> Self {
        Self::new(value, "")
    }
}

/// Channel status class from the external status source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelStatus {
    Bad,
    Noisy,
    Good,
}

impl ChannelStatus {
    /// All status classes in partition order.
    pub const ALL: [ChannelStatus; 3] = [ChannelStatus::Bad, ChannelStatus::Noisy, ChannelStatus::Good];

    /// Name used for `%STATUS%` substitution.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelStatus::Bad => "bad",
            ChannelStatus::Noisy => "noisy",
            ChannelStatus::Good => "good",
        }
    }
}

impl fmt::Display for ChannelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One row of an aggregated table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRow {
    /// Channel index.
    pub channel: Index,
    /// Metric value as evaluated.
    pub raw_value: f32,
    /// Value after clamping into the metric axis bounds.
    pub value: f32,
    /// Number of values accumulated for this channel so far.
    pub count: u32,
    /// Cumulative mean over all calls to date.
    pub mean: f64,
    /// Cumulative error of the mean.
    pub stderr: f64,
}

/// Per-range result of one aggregation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangeTable {
    /// Range the table covers.
    pub range: ChannelRange,
    /// Units reported by the evaluator (empty if no channel evaluated).
    pub units: String,
    /// Rows in the order channels appeared in the batch.
    pub rows: Vec<MetricRow>,
    /// Channels in range whose metric could not be evaluated.
    pub skipped: Vec<Index>,
    /// Statistics of the clamped values in this call only.
    pub summary: RunningStat,
}

impl RangeTable {
    /// Creates an empty table for a range.
    pub fn empty(range: ChannelRange) -> Self {
        Self {
            range,
            units: String::new(),
            rows: Vec::new(),
            skipped: Vec::new(),
            summary: RunningStat::default(),
        }
    }

    /// Adds a row and folds its value into the per-call summary.
    pub fn push(&mut self, row: MetricRow) {
        self.summary.add(row.value as f64);
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.skipped.is_empty()
    }

    /// Channels with a value, in row order.
    pub fn channels(&self) -> Vec<Index> {
        self.rows.iter().map(|r| r.channel).collect()
    }
}

/// Plot settings handed to the presentation layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlotSpec {
    /// Metric axis label.
    pub metric_label: String,
    /// Metric axis bounds, if clamping is active.
    pub metric_bounds: Option<(f32, f32)>,
    /// Plot size in pixels; zero means presentation default.
    pub size_x: u32,
    pub size_y: u32,
    /// Resolved plot file name (empty = no plot file).
    pub plot_file: String,
    /// Resolved JSON file name (empty = no JSON file).
    pub json_file: String,
}

/// A named and titled table for one range and optional status partition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangeResult {
    /// Resolved name.
    pub name: String,
    /// Resolved title.
    pub title: String,
    /// Status partition, `None` for the combined table.
    pub status: Option<ChannelStatus>,
    /// Aggregated table.
    pub table: RangeTable,
    /// Channels at which boundary lines are drawn.
    pub lines: Vec<Index>,
    /// Plot settings.
    pub plot: PlotSpec,
}

/// Bookkeeping counters snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub call_count: Index,
    pub first_run: Index,
    pub last_run: Index,
    pub first_event: Index,
    pub last_event: Index,
    pub event_count: Index,
    pub run_count: Index,
}

/// Everything produced by one batch call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombinedResult {
    pub run: Index,
    pub subrun: Index,
    pub event: Index,
    /// Metric name.
    pub metric: String,
    /// One entry per range, plus status partitions when enabled.
    pub results: Vec<RangeResult>,
    /// Configured range names the catalog could not resolve.
    pub unresolved_ranges: Vec<String>,
    /// Bookkeeping after this call.
    pub summary: RunSummary,
}

impl CombinedResult {
    /// Number of channels skipped because the metric was unavailable.
    pub fn skipped_channels(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.status.is_none())
            .map(|r| r.table.skipped.len())
            .sum()
    }
}
