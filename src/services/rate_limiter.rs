//! Fixed-window request rate limiting over a persisted counter.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::debug;

use crate::database::StoreError;
use crate::store::RateLimitStore;

/// Outcome of a rate limit check. Exceeded is a distinct outcome, never
/// conflated with authentication failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitOutcome {
    Allowed { remaining: u64 },
    Exceeded { retry_after_secs: i64 },
}

impl RateLimitOutcome {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitOutcome::Allowed { .. })
    }
}

pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn RateLimitStore>) -> Self {
        Self { store }
    }

    /// Increment the counter for `(client_id, endpoint)` and compare the
    /// result against `limit`.
    ///
    /// The write always happens first; the comparison runs on the count the
    /// store handed back, so concurrent callers each see their own
    /// increment. Store failures propagate - unlike session resolution,
    /// this path does not fail closed.
    pub async fn check(
        &self,
        client_id: &str,
        endpoint: &str,
        limit: u64,
        window_secs: u64,
    ) -> Result<RateLimitOutcome, StoreError> {
        let bucket = format!("{}:{}", client_id, endpoint);
        let counter = self
            .store
            .increment(&bucket, Duration::seconds(window_secs as i64))
            .await?;

        let count = counter.count.max(0) as u64;
        if count > limit {
            let retry_after_secs = (counter.expires_at - Utc::now()).num_seconds().max(0);
            debug!(
                bucket = %bucket,
                count = count,
                limit = limit,
                "Rate limit exceeded"
            );
            return Ok(RateLimitOutcome::Exceeded { retry_after_secs });
        }

        Ok(RateLimitOutcome::Allowed {
            remaining: limit - count,
        })
    }

    /// Remove counters whose window has elapsed.
    pub async fn purge_expired(&self) -> Result<u64, StoreError> {
        self.store.purge_expired().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryRateLimitStore;

    fn limiter() -> RateLimiter {
        RateLimiter::new(Arc::new(MemoryRateLimitStore::new()))
    }

    #[tokio::test]
    async fn limit_allows_exactly_limit_calls() {
        let limiter = limiter();

        for i in 0..10 {
            let outcome = limiter.check("1.2.3.4", "checkout", 10, 60).await.unwrap();
            assert!(outcome.is_allowed(), "call {} should be allowed", i + 1);
        }

        match limiter.check("1.2.3.4", "checkout", 10, 60).await.unwrap() {
            RateLimitOutcome::Exceeded { retry_after_secs } => {
                assert!(retry_after_secs <= 60);
            }
            RateLimitOutcome::Allowed { .. } => panic!("11th call must be rejected"),
        }
    }

    #[tokio::test]
    async fn remaining_counts_down() {
        let limiter = limiter();

        match limiter.check("c", "login", 3, 60).await.unwrap() {
            RateLimitOutcome::Allowed { remaining } => assert_eq!(remaining, 2),
            _ => panic!("first call allowed"),
        }
        match limiter.check("c", "login", 3, 60).await.unwrap() {
            RateLimitOutcome::Allowed { remaining } => assert_eq!(remaining, 1),
            _ => panic!("second call allowed"),
        }
    }

    #[tokio::test]
    async fn buckets_are_independent_per_client_and_endpoint() {
        let limiter = limiter();

        assert!(limiter.check("a", "login", 1, 60).await.unwrap().is_allowed());
        assert!(!limiter.check("a", "login", 1, 60).await.unwrap().is_allowed());

        // Different client, same endpoint
        assert!(limiter.check("b", "login", 1, 60).await.unwrap().is_allowed());
        // Same client, different endpoint
        assert!(limiter.check("a", "export", 1, 60).await.unwrap().is_allowed());
    }

    #[tokio::test]
    async fn window_elapse_resets_the_count() {
        let limiter = limiter();

        assert!(limiter.check("a", "login", 1, 1).await.unwrap().is_allowed());
        assert!(!limiter.check("a", "login", 1, 1).await.unwrap().is_allowed());

        tokio::time::sleep(std::time::Duration::from_millis(1100)).await;

        assert!(
            limiter.check("a", "login", 1, 1).await.unwrap().is_allowed(),
            "a fresh window must begin once the previous one elapses"
        );
    }
}
