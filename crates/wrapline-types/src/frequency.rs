// Periodic invocation frequency

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Interval used when no frequency component is set
pub const DEFAULT_FREQUENCY_MS: u64 = 60_000;

/// Structured interval; components are summed into milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frequency {
    #[serde(default)]
    pub ms: Option<u64>,
    #[serde(default)]
    pub sec: Option<u64>,
    #[serde(default)]
    pub min: Option<u64>,
    #[serde(default)]
    pub hours: Option<u64>,
}

impl Frequency {
    pub fn from_ms(ms: u64) -> Self {
        Frequency {
            ms: Some(ms),
            ..Default::default()
        }
    }

    pub fn from_secs(sec: u64) -> Self {
        Frequency {
            sec: Some(sec),
            ..Default::default()
        }
    }

    /// Total interval in milliseconds, or [`DEFAULT_FREQUENCY_MS`] when every
    /// component is unset or zero.
    pub fn as_millis(&self) -> u64 {
        let seconds = self
            .hours
            .unwrap_or(0)
            .saturating_mul(3600)
            .saturating_add(self.min.unwrap_or(0).saturating_mul(60))
            .saturating_add(self.sec.unwrap_or(0));
        let total = self
            .ms
            .unwrap_or(0)
            .saturating_add(seconds.saturating_mul(1000));

        if total == 0 {
            DEFAULT_FREQUENCY_MS
        } else {
            total
        }
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_millis(self.as_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_components_are_summed() {
        let freq = Frequency {
            ms: Some(500),
            sec: Some(2),
            min: Some(1),
            hours: Some(1),
        };
        assert_eq!(freq.as_millis(), 500 + 2_000 + 60_000 + 3_600_000);
    }

    #[test]
    fn test_default_when_unset() {
        assert_eq!(Frequency::default().as_millis(), DEFAULT_FREQUENCY_MS);
        assert_eq!(Frequency::from_ms(0).as_millis(), DEFAULT_FREQUENCY_MS);
        assert_eq!(Frequency::from_ms(10).as_duration(), Duration::from_millis(10));
    }
}
