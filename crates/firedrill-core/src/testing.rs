//! Deterministic random source for unit tests.

use crate::random::RandomSource;

/// Returns the same draws forever.
///
/// `below` yields `min(value, upper - 1)`, so `between(lo, hi)` always lands
/// on `lo + value`. A `unit` of 0.5 makes jitter zero and every failure roll
/// with probability <= 0.5 miss.
pub(crate) struct FixedRandom {
    below: u32,
    unit: f64,
}

impl FixedRandom {
    pub(crate) fn new(below: u32, unit: f64) -> Self {
        Self { below, unit }
    }
}

impl RandomSource for FixedRandom {
    fn below(&mut self, upper: u32) -> u32 {
        self.below.min(upper.saturating_sub(1))
    }

    fn unit(&mut self) -> f64 {
        self.unit
    }
}
