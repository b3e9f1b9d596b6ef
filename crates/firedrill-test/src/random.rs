//! Deterministic random sources.

use std::collections::VecDeque;

use firedrill_core::RandomSource;

/// Returns the same draws forever.
///
/// `below(upper)` yields `min(value, upper - 1)`: `between(lo, hi)` lands on
/// `lo + value` clamped to `hi`. A `unit` of 0.5 gives zero jitter and misses
/// every failure roll; 0.0 hits every one.
#[derive(Debug, Clone, Copy)]
pub struct FixedRandom {
    below: u32,
    unit: f64,
}

impl FixedRandom {
    /// Source answering `below` and `unit` with fixed values.
    #[must_use]
    pub fn new(below: u32, unit: f64) -> Self {
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

/// Fastest rollouts, no failures, no metric jitter.
#[must_use]
pub fn calm_random() -> FixedRandom {
    FixedRandom::new(u32::MAX, 0.5)
}

/// Slowest rollouts and every failure roll fires.
#[must_use]
pub fn failing_random() -> FixedRandom {
    FixedRandom::new(0, 0.0)
}

/// Replays queued draws, then falls back to fixed defaults.
///
/// Lets a test pin the exact progress step and failure roll of one tick
/// without reasoning about every other draw.
#[derive(Debug, Clone)]
pub struct ScriptedRandom {
    below: VecDeque<u32>,
    unit: VecDeque<f64>,
    default: FixedRandom,
}

impl ScriptedRandom {
    /// Empty script that behaves like [`calm_random`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            below: VecDeque::new(),
            unit: VecDeque::new(),
            default: calm_random(),
        }
    }

    /// Queue raw `below` answers.
    #[must_use]
    pub fn with_below(mut self, values: impl IntoIterator<Item = u32>) -> Self {
        self.below.extend(values);
        self
    }

    /// Queue raw `unit` answers.
    #[must_use]
    pub fn with_unit(mut self, values: impl IntoIterator<Item = f64>) -> Self {
        self.unit.extend(values);
        self
    }

    /// Draws used once the queues are empty.
    #[must_use]
    pub fn with_default(mut self, default: FixedRandom) -> Self {
        self.default = default;
        self
    }

    /// Queued draws not yet consumed, as `(below, unit)`.
    #[must_use]
    pub fn pending(&self) -> (usize, usize) {
        (self.below.len(), self.unit.len())
    }
}

impl Default for ScriptedRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for ScriptedRandom {
    fn below(&mut self, upper: u32) -> u32 {
        match self.below.pop_front() {
            Some(value) => value.min(upper.saturating_sub(1)),
            None => self.default.below(upper),
        }
    }

    fn unit(&mut self) -> f64 {
        self.unit.pop_front().unwrap_or(self.default.unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_random_clamps_to_bound() {
        let mut rng = FixedRandom::new(100, 0.5);
        assert_eq!(rng.below(4), 3);
        assert_eq!(rng.between(8, 15), 15);
        assert!(rng.jitter(2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn failing_random_always_fires() {
        let mut rng = failing_random();
        assert!(rng.chance(0.05));
        assert_eq!(rng.between(8, 15), 8);
    }

    #[test]
    fn scripted_values_then_default() {
        let mut rng = ScriptedRandom::new()
            .with_below([2, 9])
            .with_unit([0.1])
            .with_default(FixedRandom::new(0, 0.9));

        assert_eq!(rng.below(10), 2);
        assert_eq!(rng.below(5), 4);
        assert_eq!(rng.below(10), 0);
        assert!((rng.unit() - 0.1).abs() < f64::EPSILON);
        assert!((rng.unit() - 0.9).abs() < f64::EPSILON);
        assert_eq!(rng.pending(), (0, 0));
    }
}
