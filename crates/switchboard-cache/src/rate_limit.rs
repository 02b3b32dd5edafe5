//! Fixed-window rate limiting on store counters.

use crate::keys::CacheKeys;
use crate::metrics::CacheMetrics;
use crate::session::expiry_after;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use switchboard_config::RateLimitConfig;
use switchboard_store::{KeyTtl, StoreAdapter};
use tracing::{debug, warn};

/// Request budget per window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitPolicy {
    /// Requests admitted per window.
    pub max_requests: u64,
    /// Window length in seconds.
    pub window_secs: u64,
}

impl RateLimitPolicy {
    /// Allows `max_requests` per `window_secs`.
    #[must_use]
    pub const fn new(max_requests: u64, window_secs: u64) -> Self {
        Self {
            max_requests,
            window_secs,
        }
    }
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self::new(100, 3600)
    }
}

impl From<&RateLimitConfig> for RateLimitPolicy {
    fn from(config: &RateLimitConfig) -> Self {
        Self::new(config.max_requests, config.window_secs)
    }
}

/// Outcome of one admission check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitResult {
    /// Whether the request is admitted.
    pub allowed: bool,
    /// Requests counted in the current window, including this one.
    pub count: u64,
    /// Requests left before the limit is reached.
    pub remaining: u64,
    /// When the current window ends; `None` if the store could not say.
    pub reset_time: Option<DateTime<Utc>>,
}

impl RateLimitResult {
    fn fail_open(max_requests: u64) -> Self {
        Self {
            allowed: true,
            count: 0,
            remaining: max_requests,
            reset_time: None,
        }
    }

    /// Seconds a rejected caller should wait, for a `Retry-After` header.
    #[must_use]
    pub fn retry_after_secs(&self) -> Option<u64> {
        if self.allowed {
            return None;
        }
        let reset = self.reset_time?;
        let secs = (reset - Utc::now()).num_seconds();
        Some(u64::try_from(secs).unwrap_or(0).max(1))
    }
}

/// Fixed-window limiter keyed by `rate_limit:<identifier>`.
///
/// The first increment of a window arms the key TTL; the window ends when the
/// key expires. A caller can therefore get up to twice the budget across a
/// window boundary. Store failures fail open.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn StoreAdapter>,
    keys: CacheKeys,
    policy: RateLimitPolicy,
}

impl RateLimiter {
    /// Creates a limiter whose [`RateLimiter::check`] uses `policy`.
    #[must_use]
    pub fn new(store: Arc<dyn StoreAdapter>, keys: CacheKeys, policy: RateLimitPolicy) -> Self {
        Self {
            store,
            keys,
            policy,
        }
    }

    /// The default policy.
    #[must_use]
    pub const fn policy(&self) -> RateLimitPolicy {
        self.policy
    }

    /// Counts a request against the default policy.
    pub async fn check(&self, identifier: &str) -> RateLimitResult {
        self.check_limit(identifier, self.policy.max_requests, self.policy.window_secs)
            .await
    }

    /// Counts a request against `max_requests` per `window_secs`.
    pub async fn check_limit(
        &self,
        identifier: &str,
        max_requests: u64,
        window_secs: u64,
    ) -> RateLimitResult {
        let key = self.keys.rate_limit(identifier);
        // A zero window would make EXPIRE delete the counter.
        let window_secs = window_secs.max(1);

        let count = match self.store.increment(&key).await {
            Ok(count) => u64::try_from(count).unwrap_or(0),
            Err(e) => {
                CacheMetrics::rate_limit("fail_open");
                warn!(identifier, error = %e, "Rate limit check failed, allowing request");
                return RateLimitResult::fail_open(max_requests);
            }
        };

        if count == 1 {
            if let Err(e) = self.store.expire(&key, window_secs).await {
                warn!(identifier, error = %e, "Failed to arm rate limit window");
            }
        }

        let reset_time = self.window_end(&key, identifier, window_secs).await;
        let allowed = count <= max_requests;

        if allowed {
            CacheMetrics::rate_limit("allowed");
        } else {
            CacheMetrics::rate_limit("rejected");
            debug!(identifier, count, max_requests, "Rate limit exceeded");
        }

        RateLimitResult {
            allowed,
            count,
            remaining: max_requests.saturating_sub(count),
            reset_time,
        }
    }

    /// Reads the live window TTL, arming it if a counter was left without one.
    async fn window_end(
        &self,
        key: &str,
        identifier: &str,
        window_secs: u64,
    ) -> Option<DateTime<Utc>> {
        match self.store.ttl(key).await {
            Ok(KeyTtl::Expires(secs)) => Some(expiry_after(Utc::now(), secs)),
            Ok(KeyTtl::Persistent) => {
                // The arming EXPIRE was lost; without it the counter never resets.
                warn!(identifier, "Rate limit counter had no expiry, re-arming");
                match self.store.expire(key, window_secs).await {
                    Ok(true) => Some(expiry_after(Utc::now(), window_secs)),
                    Ok(false) => None,
                    Err(e) => {
                        warn!(identifier, error = %e, "Failed to re-arm rate limit window");
                        None
                    }
                }
            }
            Ok(KeyTtl::Missing) => None,
            Err(e) => {
                debug!(identifier, error = %e, "Rate limit TTL lookup failed");
                None
            }
        }
    }

    /// Clears the counter for `identifier`. Returns `true` if one existed.
    pub async fn reset_limit(&self, identifier: &str) -> bool {
        match self.store.delete(&self.keys.rate_limit(identifier)).await {
            Ok(deleted) => deleted,
            Err(e) => {
                warn!(identifier, error = %e, "Failed to reset rate limit");
                false
            }
        }
    }
}
