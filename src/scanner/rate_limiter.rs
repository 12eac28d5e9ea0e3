//! Rate limiting for connect attempts.
//!
//! Token bucket limiting on top of the concurrency cap, for targets that
//! react badly to connection bursts.

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as GovLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

/// A shared limit on connect attempts per second.
#[derive(Clone)]
pub struct RateLimiter {
    limiter: Arc<GovLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl RateLimiter {
    /// Create a limiter allowing `rate` attempts per second, evenly spaced.
    ///
    /// Returns `None` for a rate of 0, which means unlimited.
    pub fn new(rate: u32) -> Option<Self> {
        let rate = NonZeroU32::new(rate)?;
        let quota = Quota::per_second(rate).allow_burst(NonZeroU32::MIN);
        Some(Self {
            limiter: Arc::new(GovLimiter::direct(quota)),
        })
    }

    /// Wait until the rate limit allows another attempt.
    pub async fn wait(&self) {
        self.limiter.until_ready().await;
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[test]
    fn test_zero_rate_is_unlimited() {
        assert!(RateLimiter::new(0).is_none());
    }

    #[tokio::test]
    async fn test_rate_limiter_wait() {
        let limiter = RateLimiter::new(1000).unwrap();
        limiter.wait().await;
    }

    #[tokio::test]
    async fn test_rate_limiter_spaces_attempts() {
        let limiter = RateLimiter::new(20).unwrap();
        let shared = limiter.clone();
        let started = Instant::now();
        for _ in 0..3 {
            shared.wait().await;
        }
        assert!(started.elapsed() >= Duration::from_millis(90));
    }
}
