//! Error types for the aggregation core.
//!
//! Evaluator and catalog failures are absorbed by the caller and turned
//! into exclusion decisions; only [`BatchError`] reaches the caller of a
//! batch call.

use thiserror::Error;

/// Failure to evaluate a metric for one channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetricError {
    #[error("unknown metric '{metric}' for channel {channel}")]
    UnknownMetric { metric: String, channel: u32 },
}

/// Failure to resolve a configured channel range name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("unknown channel range: {0}")]
    UnknownRange(String),
}

/// Structural failure of a whole batch call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchError {
    #[error("no channel ranges to process (batch has no channels to span)")]
    NoRangesConfigured,
    #[error("none of the configured channel ranges could be resolved: {}", .0.join(", "))]
    NoValidRanges(Vec<String>),
}
