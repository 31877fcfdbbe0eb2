use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// 2024-01-01T00:00:00Z
const DEFAULT_EPOCH_SECS: i64 = 1_704_067_200;

/// Maps tick indices onto a simulated wall clock.
///
/// Nothing here reads the real clock: tick `n` is always
/// `epoch + n * tick_interval`, so exports are reproducible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimClock {
    pub epoch: DateTime<Utc>,
    pub tick_interval_ms: u64,
}

impl Default for SimClock {
    fn default() -> Self {
        Self {
            epoch: DateTime::from_timestamp(DEFAULT_EPOCH_SECS, 0).unwrap_or_default(),
            tick_interval_ms: 1000,
        }
    }
}

impl SimClock {
    pub fn new(epoch: DateTime<Utc>, tick_interval_ms: u64) -> Self {
        Self {
            epoch,
            tick_interval_ms,
        }
    }

    /// Simulated timestamp of `tick`, saturating at the end of chrono's range
    pub fn timestamp(&self, tick: u64) -> DateTime<Utc> {
        let millis = i64::try_from(tick.saturating_mul(self.tick_interval_ms)).unwrap_or(i64::MAX);
        Duration::try_milliseconds(millis)
            .and_then(|offset| self.epoch.checked_add_signed(offset))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}
