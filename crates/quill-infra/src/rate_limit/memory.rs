//! Per-client rate limiter using the governor crate.

use std::num::NonZeroU32;
use std::time::Duration;

use async_trait::async_trait;
use governor::clock::{Clock, DefaultClock};
use governor::{DefaultKeyedRateLimiter, Quota};

use quill_core::ports::{RateLimitDecision, RateLimitError, RateLimiter};

/// Above this many tracked clients, idle entries are dropped.
const PRUNE_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests per window for one client.
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 30,
            window: Duration::from_secs(60),
        }
    }
}

/// GCRA limiter keyed by client. Limits are per process.
pub struct InMemoryRateLimiter {
    limiter: DefaultKeyedRateLimiter<String>,
    clock: DefaultClock,
}

impl InMemoryRateLimiter {
    pub fn new(config: &RateLimitConfig) -> Result<Self, RateLimitError> {
        let burst = NonZeroU32::new(config.max_requests)
            .ok_or_else(|| RateLimitError::Backend("max_requests must be positive".into()))?;
        let quota = Quota::with_period(config.window / burst.get())
            .ok_or_else(|| RateLimitError::Backend("window must be positive".into()))?
            .allow_burst(burst);

        Ok(Self {
            limiter: DefaultKeyedRateLimiter::keyed(quota),
            clock: DefaultClock::default(),
        })
    }
}

#[async_trait]
impl RateLimiter for InMemoryRateLimiter {
    async fn check(&self, key: &str) -> Result<RateLimitDecision, RateLimitError> {
        if self.limiter.len() > PRUNE_THRESHOLD {
            self.limiter.retain_recent();
        }

        match self.limiter.check_key(&key.to_string()) {
            Ok(()) => Ok(RateLimitDecision::Allowed),
            Err(not_until) => Ok(RateLimitDecision::Limited {
                retry_after: not_until.wait_time_from(self.clock.now()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_burst_then_limited() {
        let limiter = InMemoryRateLimiter::new(&RateLimitConfig {
            max_requests: 2,
            window: Duration::from_secs(60),
        })
        .unwrap();

        assert_eq!(limiter.check("10.0.0.1").await.unwrap(), RateLimitDecision::Allowed);
        assert_eq!(limiter.check("10.0.0.1").await.unwrap(), RateLimitDecision::Allowed);
        assert!(matches!(
            limiter.check("10.0.0.1").await.unwrap(),
            RateLimitDecision::Limited { .. }
        ));
    }

    #[tokio::test]
    async fn test_clients_are_independent() {
        let limiter = InMemoryRateLimiter::new(&RateLimitConfig {
            max_requests: 1,
            window: Duration::from_secs(60),
        })
        .unwrap();

        assert_eq!(limiter.check("a").await.unwrap(), RateLimitDecision::Allowed);
        assert_eq!(limiter.check("b").await.unwrap(), RateLimitDecision::Allowed);
    }

    #[test]
    fn test_zero_requests_rejected() {
        let result = InMemoryRateLimiter::new(&RateLimitConfig {
            max_requests: 0,
            window: Duration::from_secs(60),
        });
        assert!(result.is_err());
    }
}
