//! Engine configuration with sensible defaults.
//!
//! [`FanoutConfig`] holds the per-attempt timeout and the [`RetryPolicy`]
//! applied to every provider call. Both deserialize from partial input,
//! falling back to the defaults for anything omitted.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::FanoutError;

/// Default per-attempt timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 8000;

/// Default maximum attempts per provider call (one initial try plus one retry).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 2;

/// Default base delay for exponential backoff in milliseconds.
pub const DEFAULT_BASE_DELAY_MS: u64 = 1000;

/// Default maximum delay for exponential backoff in milliseconds.
pub const DEFAULT_MAX_DELAY_MS: u64 = 5000;

/// Default backoff multiplier.
pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;

/// Retry policy for transient provider failures.
///
/// Only errors accepted by the retry classifier are retried. The delay
/// after failed attempt `n` (1-indexed) is
/// `min(base_delay_ms * backoff_multiplier^(n-1), max_delay_ms)`, plus an
/// optional random jitter of up to `jitter_ratio` of that delay.
///
/// # Examples
///
/// ```
/// use omnisearch_fanout::config::RetryPolicy;
///
/// let policy = RetryPolicy::default();
/// assert_eq!(policy.max_attempts, 2);
/// assert_eq!(policy.delay_for_attempt(1).as_millis(), 1000);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first (1 = never retry).
    pub max_attempts: u32,
    /// Base delay in milliseconds.
    pub base_delay_ms: u64,
    /// Cap on any single delay in milliseconds.
    pub max_delay_ms: u64,
    /// Growth factor between consecutive delays.
    pub backoff_multiplier: f64,
    /// Extra random delay as a fraction of the computed delay, in `[0, 1]`.
    pub jitter_ratio: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
            jitter_ratio: 0.0,
        }
    }
}

impl RetryPolicy {
    /// Create a policy with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of attempts.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the base delay in milliseconds.
    pub fn with_base_delay_ms(mut self, base_delay_ms: u64) -> Self {
        self.base_delay_ms = base_delay_ms;
        self
    }

    /// Set the maximum delay in milliseconds.
    pub fn with_max_delay_ms(mut self, max_delay_ms: u64) -> Self {
        self.max_delay_ms = max_delay_ms;
        self
    }

    /// Set the backoff multiplier.
    pub fn with_backoff_multiplier(mut self, backoff_multiplier: f64) -> Self {
        self.backoff_multiplier = backoff_multiplier;
        self
    }

    /// Set the jitter ratio.
    pub fn with_jitter_ratio(mut self, jitter_ratio: f64) -> Self {
        self.jitter_ratio = jitter_ratio;
        self
    }

    /// Delay to sleep after failed attempt number `attempt` (1-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::from_millis(0);
        }

        let base = self.base_delay_ms as f64;
        let max = self.max_delay_ms as f64;
        let exp = self.backoff_multiplier.powi(attempt as i32 - 1);
        let delay = (base * exp).min(max);

        let jitter = if self.jitter_ratio > 0.0 {
            delay * (rand::random::<f64>() * self.jitter_ratio)
        } else {
            0.0
        };

        Duration::from_millis((delay + jitter) as u64)
    }

    /// Validates this policy.
    pub fn validate(&self) -> Result<(), FanoutError> {
        if self.max_attempts == 0 {
            return Err(FanoutError::Config(
                "retry.max_attempts must be at least 1".into(),
            ));
        }
        if self.base_delay_ms > self.max_delay_ms {
            return Err(FanoutError::Config(
                "retry.base_delay_ms must be <= retry.max_delay_ms".into(),
            ));
        }
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            return Err(FanoutError::Config(
                "retry.backoff_multiplier must be >= 1.0".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.jitter_ratio) {
            return Err(FanoutError::Config(
                "retry.jitter_ratio must be within [0, 1]".into(),
            ));
        }
        Ok(())
    }
}

/// Configuration for the fan-out orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FanoutConfig {
    /// Deadline for each individual attempt in milliseconds.
    pub timeout_ms: u64,
    /// Retry policy applied around each attempt.
    pub retry: RetryPolicy,
}

impl Default for FanoutConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            retry: RetryPolicy::default(),
        }
    }
}

impl FanoutConfig {
    /// Per-attempt timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Set the per-attempt timeout in milliseconds.
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Validates this configuration, returning an error if any field is invalid.
    pub fn validate(&self) -> Result<(), FanoutError> {
        if self.timeout_ms == 0 {
            return Err(FanoutError::Config(
                "timeout_ms must be greater than 0".into(),
            ));
        }
        self.retry.validate()
    }
}
