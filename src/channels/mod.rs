//! Channel collaborators: range catalog and status classification.

pub mod catalog;
pub mod status;

pub use catalog::{ChannelRangeCatalog, StaticRangeCatalog};
pub use status::{ChannelStatusClassifier, StatusTable};
