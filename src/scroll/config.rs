use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the auto-scroll timer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollConfig {
    /// Time between scroll steps in milliseconds (default: 5000)
    pub interval_ms: u64,

    /// Fraction of the viewport advanced per step (default: 0.9)
    pub step_ratio: f64,

    /// Distance from the end that counts as "at the end" (default: 5)
    pub wrap_tolerance: f64,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            interval_ms: 5000,
            step_ratio: 0.9,
            wrap_tolerance: 5.0,
        }
    }
}

impl ScrollConfig {
    pub fn interval(&self) -> Duration {
        // A zero period would make tokio's interval panic.
        Duration::from_millis(self.interval_ms.max(1))
    }

    /// Interval in seconds, for status messages. Displays as "5", "2.5" or "0.1".
    pub fn interval_secs(&self) -> f64 {
        self.interval().as_secs_f64()
    }
}
