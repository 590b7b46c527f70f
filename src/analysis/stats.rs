//! Running statistics accumulator.

use serde::{Deserialize, Serialize};

/// Accumulates count, sum and sum of squares of a sequence of values.
///
/// `add` is the only mutator. Derived quantities are computed on demand
/// so no history is stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RunningStat {
    count: u32,
    sum: f64,
    sumsq: f64,
}

impl RunningStat {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value.
    pub fn add(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.sumsq += value * value;
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Mean of the values, 0 when empty.
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.sum / self.count as f64
    }

    /// Mean of the squared values, 0 when empty.
    pub fn mean_of_squares(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.sumsq / self.count as f64
    }

    /// `<x²> - <x>²` without Bessel correction.
    ///
    /// Rounding can make this slightly negative for constant input.
    pub fn variance(&self) -> f64 {
        let mean = self.mean();
        self.mean_of_squares() - mean * mean
    }

    /// Spread reported as "RMS". This is the uncorrected variance, not its
    /// square root; reports built on it expect that convention.
    pub fn rms(&self) -> f64 {
        self.variance()
    }

    /// Error of the mean, `sqrt(variance / count)`, 0 when empty.
    pub fn stderr_of_mean(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        (self.variance().max(0.0) / self.count as f64).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_empty_stat() {
        let stat = RunningStat::new();
        assert_eq!(stat.count(), 0);
        assert_eq!(stat.mean(), 0.0);
        assert_eq!(stat.mean_of_squares(), 0.0);
        assert_eq!(stat.stderr_of_mean(), 0.0);
        assert!(stat.is_empty());
    }

    #[test]
    fn test_mean_matches_arithmetic_mean() {
        let values = [3.0, -1.5, 8.25, 0.0, 12.0];
        let mut forward = RunningStat::new();
        let mut backward = RunningStat::new();
        for v in values {
            forward.add(v);
        }
        for v in values.iter().rev() {
            backward.add(*v);
        }

        let expected = values.iter().sum::<f64>() / values.len() as f64;
        assert_eq!(forward.count(), 5);
        assert!(close(forward.mean(), expected));
        assert!(close(backward.mean(), expected));
    }

    #[test]
    fn test_variance_is_uncorrected() {
        let mut stat = RunningStat::new();
        stat.add(1.0);
        stat.add(3.0);
        // <x²> = 5, <x>² = 4
        assert!(close(stat.variance(), 1.0));
        assert!(close(stat.rms(), 1.0));
        assert!(close(stat.stderr_of_mean(), (0.5f64).sqrt()));
    }

    #[test]
    fn test_constant_values_have_no_spread() {
        let mut stat = RunningStat::new();
        for _ in 0..10 {
            stat.add(0.1);
        }
        assert!(stat.variance().abs() < 1e-12);
        assert!(!stat.stderr_of_mean().is_nan());
    }
}
