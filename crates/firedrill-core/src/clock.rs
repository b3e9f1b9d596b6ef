//! Simulated time.

use std::time::Duration;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

/// Wall-clock period between ticks.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(5);

/// Simulated seconds per wall-clock second.
pub const DEFAULT_TIME_ACCELERATION: u32 = 10;

/// Maps wall-clock tick periods onto simulated time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationClock {
    /// Wall-clock period between ticks.
    #[serde(with = "millis")]
    pub interval: Duration,
    /// Simulated seconds per wall-clock second.
    pub acceleration: u32,
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self {
            interval: DEFAULT_TICK_INTERVAL,
            acceleration: DEFAULT_TIME_ACCELERATION,
        }
    }
}

impl SimulationClock {
    /// Clock with an explicit period and acceleration. A zero acceleration
    /// is treated as real time.
    #[must_use]
    pub fn new(interval: Duration, acceleration: u32) -> Self {
        Self {
            interval,
            acceleration: acceleration.max(1),
        }
    }

    /// Simulated time that passes in one tick.
    #[must_use]
    pub fn sim_step(&self) -> TimeDelta {
        let millis = self
            .interval
            .as_millis()
            .saturating_mul(u128::from(self.acceleration));
        let millis = i64::try_from(millis).unwrap_or(i64::MAX);
        TimeDelta::try_milliseconds(millis).unwrap_or(TimeDelta::MAX)
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(value: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_step_is_fifty_seconds() {
        assert_eq!(SimulationClock::default().sim_step(), TimeDelta::seconds(50));
    }

    #[test]
    fn zero_acceleration_is_real_time() {
        let clock = SimulationClock::new(Duration::from_millis(250), 0);
        assert_eq!(clock.sim_step(), TimeDelta::milliseconds(250));
    }

    #[test]
    fn serializes_interval_as_millis() {
        let json = serde_json::to_value(SimulationClock::default()).unwrap();
        assert_eq!(json["interval"], 5000);
        let back: SimulationClock = serde_json::from_value(json).unwrap();
        assert_eq!(back, SimulationClock::default());
    }
}
