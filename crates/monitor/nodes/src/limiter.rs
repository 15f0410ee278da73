//! A pacing gate in front of every outbound RPC call.

use std::time::Duration;
use tokio::{
    sync::Mutex,
    time::{Interval, MissedTickBehavior},
};

/// Paces callers to at most `rate` calls per second.
///
/// Calls are spaced evenly; there is no burst allowance. After an idle period the next
/// call proceeds immediately and pacing resumes from there. Concurrent callers queue on
/// the inner mutex, so the bound holds across tasks sharing the limiter.
#[derive(Debug)]
pub struct RateLimiter {
    period: Option<Duration>,
    pacer: Mutex<Option<Interval>>,
}

impl RateLimiter {
    /// Creates a limiter allowing `calls_per_second` calls. Zero disables limiting.
    pub fn new(calls_per_second: u32) -> Self {
        let period = (calls_per_second > 0).then(|| Duration::from_secs(1) / calls_per_second);
        Self { period, pacer: Mutex::new(None) }
    }

    /// Creates a limiter that never blocks.
    pub fn unlimited() -> Self {
        Self::new(0)
    }

    /// Returns `true` if this limiter never blocks.
    pub const fn is_unlimited(&self) -> bool {
        self.period.is_none()
    }

    /// Waits until the caller is permitted to proceed.
    pub async fn take(&self) {
        let Some(period) = self.period else {
            return;
        };

        let mut pacer = self.pacer.lock().await;
        let interval = pacer.get_or_insert_with(|| {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });
        interval.tick().await;
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::unlimited()
    }
}
