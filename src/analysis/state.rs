//! Mutable aggregation state that persists across batch calls.
//!
//! The orchestrator owns the single [`AggregationState`] and lends it to
//! the range aggregator by `&mut` for the duration of one call. Updates
//! are read-modify-write on the running sums, so a host running calls
//! concurrently must serialize them.

use super::stats::RunningStat;
use crate::models::{ChannelRange, Index, RunSummary};
use std::collections::BTreeMap;

/// Running statistics of one range, keyed by channel. Only channels that
/// have been seen hold an entry, so sparse or very wide ranges stay small.
pub type ChannelStats = BTreeMap<Index, RunningStat>;

/// Bookkeeping counters plus per-range, per-channel running statistics.
#[derive(Debug, Clone, Default)]
pub struct AggregationState {
    summary: RunSummary,
    range_stats: BTreeMap<ChannelRange, ChannelStats>,
}

impl AggregationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a new call for the given run and event.
    pub fn update(&mut self, run: Index, event: Index) {
        let s = &mut self.summary;
        if s.call_count == 0 {
            s.first_run = run;
            s.last_run = run;
            s.first_event = event;
            s.last_event = event;
            s.run_count = 1;
            s.event_count = 1;
        } else {
            if run != s.last_run {
                s.run_count += 1;
                s.last_run = run;
            }
            if event != s.last_event {
                s.event_count += 1;
                s.last_event = event;
            }
        }
        s.call_count += 1;
    }

    /// Statistics for a range, created empty on first use.
    pub fn stats_mut(&mut self, range: &ChannelRange) -> &mut ChannelStats {
        self.range_stats.entry(range.clone()).or_default()
    }

    pub fn stats(&self, range: &ChannelRange) -> Option<&ChannelStats> {
        self.range_stats.get(range)
    }

    /// Cumulative statistics for one channel of a range. `None` until the
    /// channel has contributed a value.
    pub fn channel_stat(&self, range: &ChannelRange, channel: Index) -> Option<&RunningStat> {
        self.stats(range)?.get(&channel)
    }

    pub fn summary(&self) -> RunSummary {
        self.summary
    }

    /// Number of ranges with accumulated statistics.
    pub fn range_count(&self) -> usize {
        self.range_stats.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_call_sets_bookkeeping() {
        let mut state = AggregationState::new();
        state.update(5, 100);
        let s = state.summary();
        assert_eq!(s.call_count, 1);
        assert_eq!(s.first_run, 5);
        assert_eq!(s.last_run, 5);
        assert_eq!(s.first_event, 100);
        assert_eq!(s.event_count, 1);
        assert_eq!(s.run_count, 1);
    }

    #[test]
    fn test_new_event_same_run() {
        let mut state = AggregationState::new();
        state.update(5, 100);
        state.update(5, 101);
        let s = state.summary();
        assert_eq!(s.call_count, 2);
        assert_eq!(s.event_count, 2);
        assert_eq!(s.run_count, 1);
        assert_eq!(s.last_event, 101);
        assert_eq!(s.first_event, 100);
    }

    #[test]
    fn test_repeated_event_and_new_run() {
        let mut state = AggregationState::new();
        state.update(5, 100);
        state.update(5, 100);
        state.update(6, 100);
        let s = state.summary();
        assert_eq!(s.call_count, 3);
        assert_eq!(s.event_count, 1);
        assert_eq!(s.run_count, 2);
        assert_eq!(s.first_run, 5);
        assert_eq!(s.last_run, 6);
    }

    #[test]
    fn test_stats_keyed_by_range_bounds_and_name() {
        let mut state = AggregationState::new();
        let range = ChannelRange::new("r", 10, 13, "");
        assert!(state.stats_mut(&range).is_empty());
        state.stats_mut(&range).entry(13).or_default().add(2.0);

        let relabeled = ChannelRange::new("r", 10, 13, "other label");
        assert_eq!(state.channel_stat(&relabeled, 13).map(|s| s.count()), Some(1));
        assert!(state.channel_stat(&relabeled, 12).is_none());
        assert_eq!(state.range_count(), 1);
    }

    #[test]
    fn test_wide_range_allocates_per_channel() {
        let mut state = AggregationState::new();
        let range = ChannelRange::new("all", 0, Index::MAX, "All");
        let stats = state.stats_mut(&range);
        stats.entry(0).or_default().add(1.0);
        stats.entry(4_000_000_000).or_default().add(3.0);

        assert_eq!(state.stats(&range).map(|s| s.len()), Some(2));
        assert_eq!(state.channel_stat(&range, 4_000_000_000).map(|s| s.mean()), Some(3.0));
    }
}
