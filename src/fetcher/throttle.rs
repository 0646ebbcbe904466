//! Minimum inter-request spacing.
//!
//! The whole pipeline is serialized, so a last-call timestamp is enough; a
//! parallel implementation would need a proper token bucket instead.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::config::SLEEP_INTERVAL;

/// Enforces a minimum wall-clock gap between outbound API calls.
///
/// The first call pays no delay but records the baseline for the next.
/// State lives on the instance rather than in a global, so tests can drive
/// it deterministically under paused tokio time.
#[derive(Debug)]
pub struct RequestThrottler {
    interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl RequestThrottler {
    /// Create a throttler with the given minimum gap.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Mutex::new(None),
        }
    }

    /// The configured minimum gap.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait until at least the configured interval has elapsed since the
    /// previous turn was granted, then record the new baseline.
    pub async fn await_turn(&self) {
        let mut last = self.last.lock().await;
        if let Some(prev) = *last {
            tokio::time::sleep_until(prev + self.interval).await;
        }
        *last = Some(Instant::now());
    }
}

impl Default for RequestThrottler {
    fn default() -> Self {
        Self::new(SLEEP_INTERVAL)
    }
}
