//! Minimum-spacing rate limiter
//!
//! Every outbound request, from discovery and from every download worker,
//! passes through one shared [`RateLimiter`]. Grants are handed out at least
//! `interval` apart no matter how many workers are waiting, which bounds the
//! request rate independently of the concurrency level.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::{sleep_until, Instant};
use tracing::trace;

use super::config::MAX_RATE_LIMIT_SECS;
use crate::metrics;

/// Rate limiter enforcing a minimum delay between grants
///
/// The only shared mutable state is the instant of the next free slot. Callers
/// reserve a slot under a short lock and then sleep without holding it, so
/// waiters never serialize on the mutex itself. No fairness between waiters
/// is promised.
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Create a limiter spacing grants by `interval`
    ///
    /// A zero interval disables throttling. Intervals above
    /// [`MAX_RATE_LIMIT_SECS`] are clamped to it.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.min(max_interval()),
            next_slot: Mutex::new(None),
        }
    }

    /// Create a limiter from a seconds value
    ///
    /// Negative and non-finite values are treated as zero. Values above
    /// [`MAX_RATE_LIMIT_SECS`] are clamped to it.
    pub fn from_secs_f64(seconds: f64) -> Self {
        let interval = if seconds.is_finite() && seconds > 0.0 {
            Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX)
        } else {
            Duration::ZERO
        };
        Self::new(interval)
    }

    /// Create a limiter that never waits
    pub fn unlimited() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Minimum spacing between grants
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether this limiter never waits
    pub fn is_unlimited(&self) -> bool {
        self.interval.is_zero()
    }

    /// Wait for the next grant
    ///
    /// Returns how long the caller waited.
    pub async fn acquire(&self) -> Duration {
        if self.is_unlimited() {
            return Duration::ZERO;
        }

        let now = Instant::now();
        let grant = {
            let mut next_slot = self
                .next_slot
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let grant = match *next_slot {
                Some(slot) if slot > now => slot,
                _ => now,
            };
            // Saturate at the grant itself rather than panic on overflow
            *next_slot = Some(grant.checked_add(self.interval).unwrap_or(grant));
            grant
        };

        let wait = grant.saturating_duration_since(now);
        if !wait.is_zero() {
            trace!(wait_ms = wait.as_millis() as u64, "Waiting for rate limit slot");
            sleep_until(grant).await;
        }
        metrics::record_rate_limit_wait(wait);
        wait
    }
}

fn max_interval() -> Duration {
    Duration::from_secs_f64(MAX_RATE_LIMIT_SECS)
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::from_secs_f64(super::config::DEFAULT_RATE_LIMIT_SECS)
    }
}
