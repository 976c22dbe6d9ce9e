//! Quota-aware retry around a single API request.
//!
//! Every outbound call goes through [`RetryExecutor`]. A call may name a cache key,
//! in which case a fresh cached value short-circuits the network entirely and a
//! successful response is stored for the requested TTL.
//!
//! Only quota exhaustion is retried. The wait comes from the server's reset time
//! when one is known (plus a one second buffer), otherwise from an exponential
//! schedule starting at [`RetryPolicy::initial_delay`]. All other failures are
//! returned immediately and never cached.

use super::{ApiError, Cache, Clock};
use chrono::{DateTime, Utc};
use core::time::Duration;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;

const LOG_TARGET: &str = "     retry";

/// TTL used when a caller doesn't choose one.
pub const DEFAULT_TTL: Duration = Duration::from_mins(5);

/// Slack added on top of a server-supplied reset time.
pub const RESET_BUFFER: Duration = Duration::from_secs(1);

/// Limits for quota-driven retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of retries after the initial attempt.
    pub max_retries: u32,

    /// First exponential backoff delay; doubles on every retry.
    pub initial_delay: Duration,

    /// Upper bound on a wait derived from a server reset time.
    pub max_reset_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_secs(1),
            max_reset_wait: Duration::from_hours(1),
        }
    }
}

/// Per-call retry bookkeeping. Lives only as long as one [`RetryExecutor`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryState {
    pub attempt_count: u32,
    pub current_delay: Duration,
}

impl RetryState {
    #[must_use]
    pub const fn new(policy: &RetryPolicy) -> Self {
        Self {
            attempt_count: 0,
            current_delay: policy.initial_delay,
        }
    }

    /// Advance the state after a quota-exhausted response.
    ///
    /// Returns the delay before the next attempt, or `None` once the retry budget is spent.
    pub fn on_quota_exhausted(&mut self, reset_at: Option<DateTime<Utc>>, now: DateTime<Utc>, policy: &RetryPolicy) -> Option<Duration> {
        if self.attempt_count >= policy.max_retries {
            return None;
        }

        let delay = reset_at.map_or(self.current_delay, |reset_at| {
            let until_reset = (reset_at - now).to_std().unwrap_or(Duration::ZERO);
            until_reset.saturating_add(RESET_BUFFER).min(policy.max_reset_wait)
        });

        self.attempt_count += 1;
        self.current_delay = self.current_delay.saturating_mul(2);
        Some(delay)
    }
}

/// Where a call currently is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Requesting,
    Backoff(Duration),
}

/// Runs requests with cache lookup and quota-driven retries.
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    cache: Cache,
    clock: Arc<dyn Clock>,
    policy: RetryPolicy,
}

impl RetryExecutor {
    #[must_use]
    pub fn new(cache: Cache, clock: Arc<dyn Clock>, policy: RetryPolicy) -> Self {
        Self { cache, clock, policy }
    }

    #[must_use]
    pub const fn cache(&self) -> &Cache {
        &self.cache
    }

    #[must_use]
    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Execute an uncached request.
    pub async fn execute<T, F, Fut>(&self, request: F) -> Result<T, ApiError>
    where
        T: Serialize + DeserializeOwned,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        self.run(None, &self.policy, request).await
    }

    /// Execute a request whose successful result is cached under `key` for `ttl`.
    pub async fn execute_cached<T, F, Fut>(&self, key: &str, ttl: Duration, request: F) -> Result<T, ApiError>
    where
        T: Serialize + DeserializeOwned,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        self.run(Some((key, ttl)), &self.policy, request).await
    }

    /// Execute a request under a policy other than the executor's default.
    pub async fn execute_with_policy<T, F, Fut>(&self, policy: &RetryPolicy, cache: Option<(&str, Duration)>, request: F) -> Result<T, ApiError>
    where
        T: Serialize + DeserializeOwned,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        self.run(cache, policy, request).await
    }

    async fn run<T, F, Fut>(&self, cache: Option<(&str, Duration)>, policy: &RetryPolicy, mut request: F) -> Result<T, ApiError>
    where
        T: Serialize + DeserializeOwned,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        if let Some((key, _)) = cache
            && let Some(hit) = self.cache.get::<T>(key)
        {
            return Ok(hit);
        }

        let label = cache.map_or("uncached request", |(key, _)| key);
        let mut state = RetryState::new(policy);
        let mut phase = Phase::Requesting;

        loop {
            match phase {
                Phase::Requesting => match request().await {
                    Ok(value) => {
                        if let Some((key, ttl)) = cache
                            && let Err(e) = self.cache.set(key, &value, ttl)
                        {
                            log::debug!(target: LOG_TARGET, "Could not cache response for {key}: {e:#}");
                        }
                        return Ok(value);
                    }

                    Err(ApiError::QuotaExhausted { reset_at }) => {
                        let Some(delay) = state.on_quota_exhausted(reset_at, self.clock.now(), policy) else {
                            let attempts = state.attempt_count + 1;
                            log::warn!(target: LOG_TARGET, "Giving up on {label} after {attempts} attempt(s): quota still exhausted");
                            return Err(ApiError::RateLimitExceeded { attempts });
                        };

                        log::warn!(
                            target: LOG_TARGET,
                            "Quota exhausted for {label}, retrying in {}ms (retry {}/{})",
                            delay.as_millis(),
                            state.attempt_count,
                            policy.max_retries
                        );
                        phase = Phase::Backoff(delay);
                    }

                    Err(e) => return Err(e),
                },

                Phase::Backoff(delay) => {
                    self.clock.sleep(delay).await;
                    phase = Phase::Requesting;
                }
            }
        }
    }
}
