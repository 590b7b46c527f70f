//! Composition of evaluators by delegation.

use super::MetricEvaluator;
use crate::error::MetricError;
use crate::models::{ChannelRecord, MetricValue};

/// Tries `primary` first and hands unknown metrics to `fallback`.
///
/// Only [`MetricError::UnknownMetric`] triggers the fallback, so an
/// extension can shadow a built-in name.
#[derive(Debug, Clone, Default)]
pub struct ChainedEvaluator<P, B> {
    primary: P,
    fallback: B,
}

impl<P, B> ChainedEvaluator<P, B> {
    pub fn new(primary: P, fallback: B) -> Self {
        Self { primary, fallback }
    }
}

impl<P: MetricEvaluator, B: MetricEvaluator> MetricEvaluator for ChainedEvaluator<P, B> {
    fn evaluate(&self, metric: &str, channel: &ChannelRecord) -> Result<MetricValue, MetricError> {
        match self.primary.evaluate(metric, channel) {
            Err(MetricError::UnknownMetric { .. }) => self.fallback.evaluate(metric, channel),
            other => other,
        }
    }
}
