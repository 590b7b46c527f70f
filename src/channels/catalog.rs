//! Channel range lookup by name.

use crate::error::RangeError;
use crate::models::{ChannelRange, Index};
use std::collections::BTreeMap;
use tracing::debug;

/// Resolves configured range names to concrete channel ranges.
pub trait ChannelRangeCatalog {
    fn resolve(&self, name: &str) -> Result<ChannelRange, RangeError>;
}

/// Number of APAs in the protoDUNE preset.
pub const PROTODUNE_APAS: Index = 6;

/// Channels per APA: u (800), v (800), z (960).
pub const PROTODUNE_APA_CHANNELS: Index = 2560;

const PROTODUNE_PLANES: [(&str, Index, Index); 3] = [("u", 0, 799), ("v", 800, 1599), ("z", 1600, 2559)];

/// Catalog backed by a fixed table of ranges.
#[derive(Debug, Clone, Default)]
pub struct StaticRangeCatalog {
    ranges: BTreeMap<String, ChannelRange>,
}

impl StaticRangeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with the protoDUNE APA and plane ranges.
    ///
    /// `apaN` spans a whole APA and `apaNu`, `apaNv`, `apaNz` its planes,
    /// for N in 1..=6.
    pub fn protodune() -> Self {
        let mut catalog = Self::new();
        for apa in 1..=PROTODUNE_APAS {
            let base = (apa - 1) * PROTODUNE_APA_CHANNELS;
            catalog.insert(ChannelRange::new(
                format!("apa{apa}"),
                base,
                base + PROTODUNE_APA_CHANNELS - 1,
                format!("APA {apa}"),
            ));
            for (plane, first, last) in PROTODUNE_PLANES {
                catalog.insert(ChannelRange::new(
                    format!("apa{apa}{plane}"),
                    base + first,
                    base + last,
                    format!("APA {apa}{plane}"),
                ));
            }
        }
        catalog
    }

    /// Adds or replaces a range, keyed by its name.
    pub fn insert(&mut self, range: ChannelRange) {
        debug!("Catalog range {}", range);
        self.ranges.insert(range.name.clone(), range);
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.ranges.keys().map(String::as_str)
    }
}

impl ChannelRangeCatalog for StaticRangeCatalog {
    fn resolve(&self, name: &str) -> Result<ChannelRange, RangeError> {
        self.ranges
            .get(name)
            .cloned()
            .ok_or_else(|| RangeError::UnknownRange(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protodune_preset() {
        let catalog = StaticRangeCatalog::protodune();
        assert_eq!(catalog.len(), 24);

        let apa2 = catalog.resolve("apa2").unwrap();
        assert_eq!((apa2.first, apa2.last), (2560, 5119));
        assert_eq!(apa2.label, "APA 2");

        let z6 = catalog.resolve("apa6z").unwrap();
        assert_eq!((z6.first, z6.last), (14400, 15359));
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let catalog = StaticRangeCatalog::protodune();
        let a = catalog.resolve("apa3v").unwrap();
        let b = catalog.resolve("apa3v").unwrap();
        assert_eq!((a.first, a.last, a.label), (b.first, b.last, b.label));
    }

    #[test]
    fn test_unknown_range() {
        let catalog = StaticRangeCatalog::new();
        assert_eq!(
            catalog.resolve("apa9"),
            Err(RangeError::UnknownRange("apa9".to_string()))
        );
    }

    #[test]
    fn test_insert_replaces_by_name() {
        let mut catalog = StaticRangeCatalog::protodune();
        catalog.insert(ChannelRange::new("apa1", 0, 9, "Test"));
        assert_eq!(catalog.len(), 24);
        assert_eq!(catalog.resolve("apa1").unwrap().last, 9);
    }
}
