//! Per-range metric aggregation.
//!
//! For one channel range and one batch, [`RangeAggregator`] evaluates the
//! metric for every channel in range, clamps it into the metric axis,
//! folds it into the persistent per-channel statistics and returns the
//! resulting table.

use super::state::AggregationState;
use crate::metric::MetricEvaluator;
use crate::models::{ChannelRange, ChannelRecord, MetricRow, RangeTable};
use tracing::{debug, trace};

/// Metric axis limits. Values outside are pinned to the nearest limit,
/// both for display and for the accumulated statistics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisBounds {
    min: f32,
    max: f32,
}

impl AxisBounds {
    /// Returns `None` unless `min < max`; degenerate or inverted bounds
    /// mean no clamping.
    pub fn new(min: f32, max: f32) -> Option<Self> {
        (min < max).then_some(Self { min, max })
    }

    pub fn min(&self) -> f32 {
        self.min
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    pub fn clamp(&self, value: f32) -> f32 {
        if value < self.min {
            self.min
        } else if value > self.max {
            self.max
        } else {
            value
        }
    }
}

/// Aggregates one metric over channel ranges.
pub struct RangeAggregator<'a> {
    metric: &'a str,
    evaluator: &'a dyn MetricEvaluator,
    bounds: Option<AxisBounds>,
}

impl<'a> RangeAggregator<'a> {
    pub fn new(metric: &'a str, evaluator: &'a dyn MetricEvaluator, bounds: Option<AxisBounds>) -> Self {
        Self {
            metric,
            evaluator,
            bounds,
        }
    }

    /// Evaluates the channels of `batch` that lie in `range` and updates
    /// the range's running statistics in `state`.
    ///
    /// Channels whose metric cannot be evaluated are listed in
    /// [`RangeTable::skipped`] and leave the statistics untouched. An empty
    /// batch, or one with no channel in range, does not touch the state.
    pub fn aggregate(
        &self,
        range: &ChannelRange,
        batch: &[ChannelRecord],
        state: &mut AggregationState,
    ) -> RangeTable {
        self.aggregate_keyed(range, range, batch, state)
    }

    /// Like [`aggregate`](Self::aggregate), but accumulates into the
    /// statistics stored under `key`. The table still reports `range`.
    pub fn aggregate_keyed(
        &self,
        range: &ChannelRange,
        key: &ChannelRange,
        batch: &[ChannelRecord],
        state: &mut AggregationState,
    ) -> RangeTable {
        let mut table = RangeTable::empty(range.clone());

        let in_range: Vec<&ChannelRecord> = batch
            .iter()
            .filter(|rec| range.contains(rec.channel))
            .collect();
        if in_range.is_empty() {
            return table;
        }

        let stats = state.stats_mut(key);

        for rec in in_range {
            let metric = match self.evaluator.evaluate(self.metric, rec) {
                Ok(m) => m,
                Err(e) => {
                    trace!("Skipping channel: {}", e);
                    table.skipped.push(rec.channel);
                    continue;
                }
            };

            let value = match self.bounds {
                Some(bounds) => bounds.clamp(metric.value),
                None => metric.value,
            };

            let stat = stats.entry(rec.channel).or_default();
            stat.add(value as f64);

            if table.units.is_empty() {
                table.units = metric.units;
            }
            table.push(MetricRow {
                channel: rec.channel,
                raw_value: metric.value,
                value,
                count: stat.count(),
                mean: stat.mean(),
                stderr: stat.stderr_of_mean(),
            });
        }

        debug!(
            "Range {}: {} channels evaluated, {} skipped",
            range,
            table.rows.len(),
            table.skipped.len()
        );

        table
    }
}
