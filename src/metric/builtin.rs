//! Built-in metrics.

use super::{unknown, MetricEvaluator};
use crate::error::MetricError;
use crate::models::{ChannelRecord, MetricValue};

/// Channels read out by one FEMB.
pub const CHANNELS_PER_FEMB: u32 = 128;

/// FEMBs mounted on one APA.
pub const FEMBS_PER_APA: u32 = 20;

/// Threshold, in units of the noise estimate, for `rawTailFraction`.
pub const TAIL_THRESHOLD: f32 = 3.0;

const ADC_UNITS: &str = "ADC count";

/// The standard metric set:
///
/// - `pedestal`, `pedestalRms`
/// - `fembID` (global FEMB number), `apaFembID` (FEMB within its APA),
///   `fembChannel` (channel within its FEMB)
/// - `rawRms`: RMS of raw minus pedestal
/// - `rawTailFraction`: fraction of ticks with |raw - pedestal| above
///   [`TAIL_THRESHOLD`] times the noise estimate
///
/// Any other name is looked up in the channel metadata.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinMetrics;

impl MetricEvaluator for BuiltinMetrics {
    fn evaluate(&self, metric: &str, channel: &ChannelRecord) -> Result<MetricValue, MetricError> {
        let value = match metric {
            "pedestal" => MetricValue::new(channel.pedestal, ADC_UNITS),
            "pedestalRms" => MetricValue::new(channel.pedestal_rms, ADC_UNITS),
            "fembID" => MetricValue::unitless(femb_id(channel.channel) as f32),
            "apaFembID" => MetricValue::unitless((femb_id(channel.channel) % FEMBS_PER_APA) as f32),
            "fembChannel" => MetricValue::unitless((channel.channel % CHANNELS_PER_FEMB) as f32),
            "rawRms" => MetricValue::new(raw_rms(channel), ADC_UNITS),
            "rawTailFraction" => MetricValue::unitless(raw_tail_fraction(channel)),
            _ => match channel.metadata.get(metric) {
                Some(&v) => MetricValue::unitless(v),
                None => return Err(unknown(metric, channel)),
            },
        };
        Ok(value)
    }
}

fn femb_id(channel: u32) -> u32 {
    channel / CHANNELS_PER_FEMB
}

/// RMS of (raw - pedestal); 0 when there are no samples.
fn raw_rms(channel: &ChannelRecord) -> f32 {
    if channel.raw.is_empty() {
        return 0.0;
    }
    let sumsq: f64 = channel
        .raw
        .iter()
        .map(|&adc| {
            let d = adc as f64 - channel.pedestal as f64;
            d * d
        })
        .sum();
    (sumsq / channel.raw.len() as f64).sqrt() as f32
}

/// Fraction of samples whose deviation from the pedestal exceeds the tail
/// threshold; 0 when there are no samples.
fn raw_tail_fraction(channel: &ChannelRecord) -> f32 {
    if channel.raw.is_empty() {
        return 0.0;
    }
    let limit = TAIL_THRESHOLD * channel.pedestal_rms;
    let tail = channel
        .raw
        .iter()
        .filter(|&&adc| (adc as f32 - channel.pedestal).abs() > limit)
        .count();
    tail as f32 / channel.raw.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn record() -> ChannelRecord {
        ChannelRecord {
            channel: 2700,
            pedestal: 500.0,
            pedestal_rms: 2.0,
            raw: vec![500, 502, 498, 510, 500, 490, 500, 501],
            metadata: HashMap::from([("gain".to_string(), 14.0)]),
        }
    }

    #[test]
    fn test_pedestal_metrics() {
        let rec = record();
        let ped = BuiltinMetrics.evaluate("pedestal", &rec).unwrap();
        assert_eq!(ped.value, 500.0);
        assert_eq!(ped.units, "ADC count");

        let rms = BuiltinMetrics.evaluate("pedestalRms", &rec).unwrap();
        assert_eq!(rms.value, 2.0);
    }

    #[test]
    fn test_femb_indices() {
        let rec = record();
        // 2700 / 128 = 21, 21 % 20 = 1, 2700 % 128 = 12
        assert_eq!(BuiltinMetrics.evaluate("fembID", &rec).unwrap().value, 21.0);
        assert_eq!(BuiltinMetrics.evaluate("apaFembID", &rec).unwrap().value, 1.0);
        assert_eq!(BuiltinMetrics.evaluate("fembChannel", &rec).unwrap().value, 12.0);
        assert_eq!(BuiltinMetrics.evaluate("fembID", &rec).unwrap().units, "");
    }

    #[test]
    fn test_raw_rms() {
        let rec = ChannelRecord {
            channel: 0,
            pedestal: 100.0,
            raw: vec![103, 97, 103, 97],
            ..ChannelRecord::default()
        };
        let rms = BuiltinMetrics.evaluate("rawRms", &rec).unwrap();
        assert!((rms.value - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_raw_tail_fraction() {
        // Limit is 6 counts: 510 and 490 are in the tail.
        let frac = BuiltinMetrics.evaluate("rawTailFraction", &record()).unwrap();
        assert!((frac.value - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_empty_samples() {
        let rec = ChannelRecord::with_pedestal(1, 10.0);
        assert_eq!(BuiltinMetrics.evaluate("rawRms", &rec).unwrap().value, 0.0);
        assert_eq!(BuiltinMetrics.evaluate("rawTailFraction", &rec).unwrap().value, 0.0);
    }

    #[test]
    fn test_metadata_fallback() {
        let gain = BuiltinMetrics.evaluate("gain", &record()).unwrap();
        assert_eq!(gain.value, 14.0);
        assert_eq!(gain.units, "");
    }

    #[test]
    fn test_unknown_metric() {
        let err = BuiltinMetrics.evaluate("nonsense", &record()).unwrap_err();
        assert_eq!(
            err,
            MetricError::UnknownMetric {
                metric: "nonsense".to_string(),
                channel: 2700
            }
        );
    }
}
