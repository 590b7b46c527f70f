//! Presentation of aggregated results.

pub mod generator;

pub use generator::{generate_summary_text, write_outputs};
