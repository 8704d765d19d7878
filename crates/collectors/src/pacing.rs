//! Pacing policy between a collector's outbound calls.
//!
//! Each collector owns one [`Pacer`] calibrated to its provider's
//! informal rate limit and awaits it before every sub-fetch. This
//! replaces scattering fixed sleeps through collector bodies.

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use nonzero_ext::nonzero;
use std::sync::Arc;
use std::time::Duration;

/// Minimum-interval pacer. The first call passes immediately;
/// subsequent calls wait out the remainder of the interval.
#[derive(Clone)]
pub struct Pacer {
    min_interval: Duration,
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl Pacer {
    /// Creates a pacer with the given minimum inter-call interval.
    ///
    /// Sub-millisecond intervals are clamped up to one millisecond.
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        let interval = min_interval.max(Duration::from_millis(1));
        let quota =
            Quota::with_period(interval).unwrap_or_else(|| Quota::per_second(nonzero!(1000u32)));
        Self {
            min_interval: interval,
            limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }

    /// Returns the configured minimum interval.
    #[must_use]
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Waits until the next call is allowed.
    pub async fn pause(&self) {
        self.limiter.until_ready().await;
    }
}

impl std::fmt::Debug for Pacer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pacer")
            .field("min_interval", &self.min_interval)
            .finish()
    }
}
