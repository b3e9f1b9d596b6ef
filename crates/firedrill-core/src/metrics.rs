//! Global metrics aggregation.
//!
//! Folds the per-region error rates into a smoothed global error rate and
//! P99 latency, applies failure penalties or recovery, adds jitter, then
//! clamps to hard bounds.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::{INITIAL_TRAFFIC_VOLUME, REGION_COUNT};
use crate::random::RandomSource;
use crate::regions::RegionMap;
use crate::workflow::WorkflowState;

/// Global error rate floor (percent).
pub const ERROR_RATE_FLOOR: f64 = 0.3;
/// Global error rate ceiling (percent).
pub const ERROR_RATE_CEILING: f64 = 5.0;
/// P99 latency floor (ms).
pub const LATENCY_FLOOR: f64 = 45.0;
/// P99 latency ceiling (ms).
pub const LATENCY_CEILING: f64 = 200.0;

/// Weight of the previous value in the smoothed blend.
const SMOOTHING: f64 = 0.8;
const LATENCY_PER_ERROR_POINT: f64 = 15.0;
const FAILING_ERROR_PENALTY: f64 = 0.25;
const FAILING_LATENCY_PENALTY: f64 = 12.0;
const HEALTHY_REGION_MEAN: f64 = 1.0;
const RECOVERY_ERROR_STEP: f64 = 0.05;
const RECOVERY_LATENCY_STEP: f64 = 3.0;
const ERROR_JITTER: f64 = 0.05;
const LATENCY_JITTER: f64 = 2.5;

/// Fleet-wide health figures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlobalMetrics {
    /// Error rate (percent).
    pub error_rate: f64,
    /// P99 latency (ms).
    pub latency_p99: f64,
    /// Requests per second.
    pub traffic_volume: u64,
}

impl Default for GlobalMetrics {
    fn default() -> Self {
        Self {
            error_rate: ERROR_RATE_FLOOR,
            latency_p99: LATENCY_FLOOR,
            traffic_volume: INITIAL_TRAFFIC_VOLUME,
        }
    }
}

/// Direction a metric is heading, for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    /// Above the comfortable band.
    Elevated,
    /// Noticeable but tolerable.
    Moderate,
    /// Nominal.
    Normal,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Elevated => "ELEVATED",
            Self::Moderate => "MODERATE",
            Self::Normal => "NORMAL",
        })
    }
}

impl GlobalMetrics {
    /// Next tick's metrics from the current ones and the region workflows.
    #[must_use]
    pub fn aggregate(&self, regions: &RegionMap, rng: &mut dyn RandomSource) -> Self {
        let mean = regions.mean_error_rate();
        let failing =
            regions.count(|w| w.state() == WorkflowState::PatchFailed || w.is_wrong_patch());

        let mut error_rate = SMOOTHING * self.error_rate + (1.0 - SMOOTHING) * mean;
        let mut latency = SMOOTHING * self.latency_p99
            + (1.0 - SMOOTHING) * (LATENCY_FLOOR + LATENCY_PER_ERROR_POINT * mean);

        if failing > 0 {
            let n = f64::from(u32::try_from(failing).unwrap_or(u32::MAX));
            error_rate += FAILING_ERROR_PENALTY * n;
            latency += FAILING_LATENCY_PENALTY * n;
        } else if mean < HEALTHY_REGION_MEAN {
            error_rate -= RECOVERY_ERROR_STEP;
            latency -= RECOVERY_LATENCY_STEP;
        }

        error_rate += rng.jitter(ERROR_JITTER);
        latency += rng.jitter(LATENCY_JITTER);

        Self {
            error_rate: clamp_finite(error_rate, ERROR_RATE_FLOOR, ERROR_RATE_CEILING),
            latency_p99: clamp_finite(latency, LATENCY_FLOOR, LATENCY_CEILING),
            traffic_volume: self.traffic_volume,
        }
    }

    /// Error rate trend label.
    #[must_use]
    pub fn error_trend(&self) -> Trend {
        if self.error_rate > 1.0 {
            Trend::Elevated
        } else if self.error_rate > 0.5 {
            Trend::Moderate
        } else {
            Trend::Normal
        }
    }

    /// Latency trend label.
    #[must_use]
    pub fn latency_trend(&self) -> Trend {
        if self.latency_p99 > 100.0 {
            Trend::Elevated
        } else if self.latency_p99 > 60.0 {
            Trend::Moderate
        } else {
            Trend::Normal
        }
    }

    /// Health score from 0 to 100.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn health_score(&self, remediated_regions: usize) -> u8 {
        let remediated = f64::from(u32::try_from(remediated_regions).unwrap_or(u32::MAX));
        let total = REGION_COUNT as f64;
        let score = 70.0 + remediated / total * 30.0 - self.error_rate * 5.0;
        score.round().clamp(0.0, 100.0) as u8
    }
}

fn clamp_finite(value: f64, floor: f64, ceiling: f64) -> f64 {
    if value.is_nan() {
        floor
    } else {
        value.clamp(floor, ceiling)
    }
}
