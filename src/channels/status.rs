//! Channel status classification (bad, noisy, good).

use crate::models::{ChannelStatus, Index};
use std::collections::HashSet;

/// Classifies channels by status.
pub trait ChannelStatusClassifier {
    fn classify(&self, channel: Index) -> ChannelStatus;
}

/// Status from fixed lists of bad and noisy channels. A channel listed as
/// both is bad; anything unlisted is good.
#[derive(Debug, Clone, Default)]
pub struct StatusTable {
    bad: HashSet<Index>,
    noisy: HashSet<Index>,
}

impl StatusTable {
    pub fn new(bad: impl IntoIterator<Item = Index>, noisy: impl IntoIterator<Item = Index>) -> Self {
        Self {
            bad: bad.into_iter().collect(),
            noisy: noisy.into_iter().collect(),
        }
    }

    /// Channels present in both lists.
    pub fn conflicts(&self) -> Vec<Index> {
        let mut both: Vec<Index> = self.bad.intersection(&self.noisy).copied().collect();
        both.sort_unstable();
        both
    }
}

impl ChannelStatusClassifier for StatusTable {
    fn classify(&self, channel: Index) -> ChannelStatus {
        if self.bad.contains(&channel) {
            ChannelStatus::Bad
        } else if self.noisy.contains(&channel) {
            ChannelStatus::Noisy
        } else {
            ChannelStatus::Good
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let table = StatusTable::new([1, 5], [2, 5]);
        assert_eq!(table.classify(1), ChannelStatus::Bad);
        assert_eq!(table.classify(2), ChannelStatus::Noisy);
        assert_eq!(table.classify(3), ChannelStatus::Good);
        // Bad wins over noisy.
        assert_eq!(table.classify(5), ChannelStatus::Bad);
        assert_eq!(table.conflicts(), vec![5]);
    }

    #[test]
    fn test_empty_table_is_all_good() {
        let table = StatusTable::default();
        assert!((0..100).all(|ch| table.classify(ch) == ChannelStatus::Good));
    }
}
