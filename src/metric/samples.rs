//! Metrics computed directly from the raw samples.

use super::{unknown, MetricEvaluator};
use crate::error::MetricError;
use crate::models::{ChannelRecord, MetricValue};

/// Adds `sampleCount`, `rawMin`, `rawMax` and `rawMean`. Meant to sit in
/// front of [`super::BuiltinMetrics`]; every other name is reported unknown.
#[derive(Debug, Clone, Copy, Default)]
pub struct SampleMetrics;

impl MetricEvaluator for SampleMetrics {
    fn evaluate(&self, metric: &str, channel: &ChannelRecord) -> Result<MetricValue, MetricError> {
        let raw = &channel.raw;
        let value = match metric {
            "sampleCount" => MetricValue::unitless(raw.len() as f32),
            "rawMin" => MetricValue::new(raw.iter().copied().min().unwrap_or(0) as f32, "ADC count"),
            "rawMax" => MetricValue::new(raw.iter().copied().max().unwrap_or(0) as f32, "ADC count"),
            "rawMean" => {
                let mean = if raw.is_empty() {
                    0.0
                } else {
                    raw.iter().map(|&adc| adc as f64).sum::<f64>() / raw.len() as f64
                };
                MetricValue::new(mean as f32, "ADC count")
            }
            _ => return Err(unknown(metric, channel)),
        };
        Ok(value)
    }
}
