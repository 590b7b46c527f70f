//! # chanmetric
//!
//! Per-channel metrics for detector readout with running statistics per
//! channel range.
//!
//! For each event a [`metric::MetricEvaluator`] turns every channel's
//! readout into a scalar (pedestal, noise, tail fraction, a metadata
//! field, ...). The [`analysis::BatchOrchestrator`] groups channels into
//! named ranges from a [`channels::ChannelRangeCatalog`], folds the values
//! into per-channel running statistics that persist across events, and
//! hands named tables to the presentation layer in [`report`].
//!
//! ```
//! use chanmetric::analysis::{BatchOrchestrator, MetricSettings};
//! use chanmetric::channels::{StaticRangeCatalog, StatusTable};
//! use chanmetric::metric::BuiltinMetrics;
//! use chanmetric::models::{ChannelRecord, EventBatch};
//!
//! let mut orchestrator = BatchOrchestrator::new(
//!     MetricSettings::default(),
//!     &StaticRangeCatalog::protodune(),
//!     Box::new(BuiltinMetrics),
//!     Box::new(StatusTable::default()),
//! );
//!
//! let batch = EventBatch {
//!     run: 1,
//!     subrun: 0,
//!     event: 1,
//!     channels: vec![ChannelRecord::with_pedestal(0, 500.0)],
//! };
//! let result = orchestrator.run(&batch).unwrap();
//! assert_eq!(result.results[0].table.rows[0].mean, 500.0);
//! ```

pub mod analysis;
pub mod channels;
pub mod cli;
pub mod config;
pub mod error;
pub mod metric;
pub mod models;
pub mod naming;
pub mod report;
pub mod scanner;
