//! Token bucket rate limiting for the submission endpoint
//!
//! One bucket per client key so a single noisy respondent cannot starve the
//! rest. Injected into the service as a trait object so tests can swap it out.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use async_trait::async_trait;
use log::debug;

/// Rate limiting configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub requests_per_minute: u32,
    pub burst_capacity: u32,
    pub enabled: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: 10, // submission budget per respondent
            burst_capacity: 10,
            enabled: true,
        }
    }
}

impl RateLimitConfig {
    /// Disable rate limiting (for testing)
    pub fn disabled() -> Self {
        Self {
            requests_per_minute: u32::MAX,
            burst_capacity: u32::MAX,
            enabled: false,
        }
    }
}

/// Admission decision for one submission attempt from one client.
#[async_trait]
pub trait SubmissionGate: Send + Sync {
    /// Returns false when the client is over budget right now.
    async fn admit(&self, client: &str) -> bool;
}

/// Per-client token bucket rate limiter
#[derive(Debug, Clone)]
pub struct KeyedRateLimiter {
    buckets: Arc<Mutex<HashMap<String, Bucket>>>,
    config: RateLimitConfig,
}

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
    requests_made: u64,
    requests_rejected: u64,
}

impl KeyedRateLimiter {
    /// Create a new rate limiter with the given configuration
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            buckets: Arc::new(Mutex::new(HashMap::new())),
            config,
        }
    }

    /// Try to take a token for the client without waiting.
    /// Returns true if acquired, false if rate limited.
    pub fn try_acquire(&self, client: &str) -> bool {
        if !self.config.enabled {
            return true;
        }

        let mut buckets = self.buckets.lock().unwrap();
        let bucket = buckets
            .entry(client.to_string())
            .or_insert_with(|| Bucket {
                tokens: self.config.burst_capacity as f64,
                last_refill: Instant::now(),
                requests_made: 0,
                requests_rejected: 0,
            });

        // Refill tokens based on time passed
        let elapsed = bucket.last_refill.elapsed();
        let tokens_per_second = self.config.requests_per_minute as f64 / 60.0;
        let tokens_to_add = elapsed.as_secs_f64() * tokens_per_second;
        if tokens_to_add > 0.0 {
            bucket.tokens = (bucket.tokens + tokens_to_add).min(self.config.burst_capacity as f64);
            bucket.last_refill = Instant::now();
        }

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            bucket.requests_made += 1;
            debug!(
                "Rate limiter: request from '{}' approved, {:.2} tokens remaining",
                client, bucket.tokens
            );
            true
        } else {
            bucket.requests_rejected += 1;
            debug!(
                "Rate limiter: request from '{}' rejected, {:.2} tokens available",
                client, bucket.tokens
            );
            false
        }
    }

    /// Current statistics for one client key
    pub fn stats(&self, client: &str) -> Option<ClientStats> {
        let buckets = self.buckets.lock().unwrap();
        buckets.get(client).map(|bucket| ClientStats {
            tokens_available: bucket.tokens,
            requests_made: bucket.requests_made,
            requests_rejected: bucket.requests_rejected,
        })
    }

    /// Drop all buckets, resetting every client to full burst capacity
    pub fn reset(&self) {
        self.buckets.lock().unwrap().clear();
    }
}

#[async_trait]
impl SubmissionGate for KeyedRateLimiter {
    async fn admit(&self, client: &str) -> bool {
        self.try_acquire(client)
    }
}

/// Rate limiter statistics for one client
#[derive(Debug, Clone)]
pub struct ClientStats {
    pub tokens_available: f64,
    pub requests_made: u64,
    pub requests_rejected: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{Duration, sleep};

    #[tokio::test]
    async fn test_rate_limiter_disabled() {
        let limiter = KeyedRateLimiter::new(RateLimitConfig::disabled());

        // Should allow unlimited requests when disabled
        for _ in 0..100 {
            assert!(limiter.try_acquire("client"));
        }
    }

    #[tokio::test]
    async fn test_rate_limiter_burst_capacity() {
        let config = RateLimitConfig {
            requests_per_minute: 60,
            burst_capacity: 5,
            enabled: true,
        };

        let limiter = KeyedRateLimiter::new(config);

        // Should allow burst capacity requests immediately
        for _ in 0..5 {
            assert!(limiter.try_acquire("client"));
        }

        // Next request should be rejected
        assert!(!limiter.try_acquire("client"));
    }

    #[tokio::test]
    async fn test_rate_limiter_keys_are_independent() {
        let config = RateLimitConfig {
            requests_per_minute: 60,
            burst_capacity: 1,
            enabled: true,
        };

        let limiter = KeyedRateLimiter::new(config);

        assert!(limiter.try_acquire("alice"));
        assert!(!limiter.try_acquire("alice"));

        // A different client still has its own budget
        assert!(limiter.try_acquire("bob"));
    }

    #[tokio::test]
    async fn test_rate_limiter_token_refill() {
        let config = RateLimitConfig {
            requests_per_minute: 120, // 2 requests per second
            burst_capacity: 2,
            enabled: true,
        };

        let limiter = KeyedRateLimiter::new(config);

        // Use up burst capacity
        assert!(limiter.try_acquire("client"));
        assert!(limiter.try_acquire("client"));
        assert!(!limiter.try_acquire("client"));

        // Wait for token refill (0.5 seconds = 1 token at 2 tokens/sec)
        sleep(Duration::from_millis(600)).await;

        // Should have one token available now
        assert!(limiter.try_acquire("client"));
        assert!(!limiter.try_acquire("client"));
    }

    #[tokio::test]
    async fn test_rate_limiter_stats() {
        let config = RateLimitConfig {
            requests_per_minute: 60,
            burst_capacity: 3,
            enabled: true,
        };

        let limiter = KeyedRateLimiter::new(config);

        limiter.try_acquire("client"); // approved
        limiter.try_acquire("client"); // approved
        limiter.try_acquire("client"); // approved
        limiter.try_acquire("client"); // rejected

        let stats = limiter.stats("client").unwrap();
        assert_eq!(stats.requests_made, 3);
        assert_eq!(stats.requests_rejected, 1);
        assert!(limiter.stats("unseen").is_none());
    }

    #[tokio::test]
    async fn test_reset_restores_capacity() {
        let config = RateLimitConfig {
            requests_per_minute: 60,
            burst_capacity: 1,
            enabled: true,
        };

        let limiter = KeyedRateLimiter::new(config);
        assert!(limiter.try_acquire("client"));
        assert!(!limiter.try_acquire("client"));

        limiter.reset();
        assert!(limiter.try_acquire("client"));
    }
}
