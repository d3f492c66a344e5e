//! Rate limiting port for public write endpoints.

use async_trait::async_trait;
use std::time::Duration;

/// Rate limiter keyed by client (usually the peer address).
#[async_trait]
pub trait RateLimiter: Send + Sync {
    async fn check(&self, key: &str) -> Result<RateLimitDecision, RateLimitError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed,
    Limited { retry_after: Duration },
}

#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    #[error("Backend error: {0}")]
    Backend(String),
}
