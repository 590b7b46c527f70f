//! Aggregation engine.
//!
//! Running statistics, the persistent aggregation state, per-range
//! aggregation and the batch orchestrator that drives them.

pub mod aggregator;
pub mod lines;
pub mod orchestrator;
pub mod state;
pub mod stats;

pub use aggregator::{AxisBounds, RangeAggregator};
pub use lines::line_positions;
pub use orchestrator::{all_channels_key, split_by_status, BatchOrchestrator, MetricSettings, ALL_RANGES};
pub use state::{AggregationState, ChannelStats};
pub use stats::RunningStat;
