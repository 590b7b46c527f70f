//! Positions of channel boundary lines (APA, FEMB, plane edges).

use crate::models::{ChannelRange, Index};
use std::collections::BTreeSet;

/// Channels within `range` at which boundary lines are drawn.
///
/// With `modulus == 0` the pattern entries are absolute channels. Otherwise
/// a line is drawn at every `N * modulus + p` for any integer `N` and any
/// pattern entry `p`. Bounds are inclusive; the result is sorted and free of
/// duplicates.
pub fn line_positions(range: &ChannelRange, modulus: Index, pattern: &[Index]) -> Vec<Index> {
    if range.width() == 0 {
        return Vec::new();
    }

    let mut lines = BTreeSet::new();

    if modulus == 0 {
        lines.extend(pattern.iter().copied().filter(|&ch| range.contains(ch)));
        return lines.into_iter().collect();
    }

    let first = range.first as i64;
    let last = range.last as i64;
    let step = modulus as i64;

    for &p in pattern {
        let p = p as i64;
        // Smallest N with N*step + p >= first.
        let n = (first - p).div_euclid(step) + i64::from((first - p).rem_euclid(step) != 0);
        let mut ch = n * step + p;
        while ch <= last {
            lines.insert(ch as Index);
            ch += step;
        }
    }

    lines.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(first: Index, last: Index) -> ChannelRange {
        ChannelRange::new("r", first, last, "")
    }

    #[test]
    fn test_absolute_pattern() {
        assert_eq!(line_positions(&range(0, 9), 0, &[2, 5]), vec![2, 5]);
        assert_eq!(line_positions(&range(0, 9), 0, &[5, 12, 2, 5]), vec![2, 5]);
    }

    #[test]
    fn test_repeating_pattern() {
        assert_eq!(line_positions(&range(0, 9), 4, &[0]), vec![0, 4, 8]);
    }

    #[test]
    fn test_inclusive_bounds() {
        assert_eq!(line_positions(&range(4, 8), 4, &[0]), vec![4, 8]);
        assert_eq!(line_positions(&range(5, 7), 4, &[0]), Vec::<Index>::new());
    }

    #[test]
    fn test_pattern_larger_than_modulus() {
        // 10 + N*4 reaches below 10 as well.
        assert_eq!(line_positions(&range(0, 12), 4, &[10]), vec![2, 6, 10]);
    }

    #[test]
    fn test_overlapping_entries_deduplicated() {
        assert_eq!(line_positions(&range(0, 9), 2, &[0, 4]), vec![0, 2, 4, 6, 8]);
    }

    #[test]
    fn test_empty_pattern() {
        assert!(line_positions(&range(0, 100), 10, &[]).is_empty());
    }

    #[test]
    fn test_offset_range() {
        // protoDUNE FEMB boundaries every 128 channels.
        let lines = line_positions(&range(2560, 3000), 128, &[0]);
        assert_eq!(lines, vec![2560, 2688, 2816, 2944]);
    }
}
