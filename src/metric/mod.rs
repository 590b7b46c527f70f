//! Per-channel metric evaluation.
//!
//! A [`MetricEvaluator`] turns one channel's readout into a scalar value
//! and units for a named metric. [`BuiltinMetrics`] knows the standard
//! names and falls back to the channel metadata; extra metrics are added
//! by composing an evaluator in front of it with [`ChainedEvaluator`].

pub mod builtin;
pub mod chain;
pub mod samples;

pub use builtin::BuiltinMetrics;
pub use chain::ChainedEvaluator;
pub use samples::SampleMetrics;

use crate::error::MetricError;
use crate::models::{ChannelRecord, MetricValue};

/// Capability to evaluate a named metric for one channel.
///
/// Implementations must be pure: the result depends only on the metric
/// name and the channel record. An evaluator that does not know a name
/// returns [`MetricError::UnknownMetric`] so a chain can try the next one.
pub trait MetricEvaluator {
    fn evaluate(&self, metric: &str, channel: &ChannelRecord) -> Result<MetricValue, MetricError>;

    /// Chain a fallback evaluator behind this one.
    fn or_else<B>(self, fallback: B) -> ChainedEvaluator<Self, B>
    where
        Self: Sized,
        B: MetricEvaluator,
    {
        ChainedEvaluator::new(self, fallback)
    }
}

impl<E: MetricEvaluator + ?Sized> MetricEvaluator for Box<E> {
    fn evaluate(&self, metric: &str, channel: &ChannelRecord) -> Result<MetricValue, MetricError> {
        (**self).evaluate(metric, channel)
    }
}

/// Evaluator used by the command-line tool: sample statistics in front of
/// the built-in set.
pub fn default_evaluator() -> ChainedEvaluator<SampleMetrics, BuiltinMetrics> {
    SampleMetrics.or_else(BuiltinMetrics)
}

pub(crate) fn unknown(metric: &str, channel: &ChannelRecord) -> MetricError {
    MetricError::UnknownMetric {
        metric: metric.to_string(),
        channel: channel.channel,
    }
}
