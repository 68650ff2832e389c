//! How often, and how patiently, a broken row stream is resumed.

use rand::Rng as _;
use std::time::Duration;
use tonic::Code;

/// Number of times a broken stream is resumed before giving up.
pub const DEFAULT_READ_RETRY_COUNT: u32 = 3;

/// Status codes that indicate the stream broke rather than the request being rejected.
pub const DEFAULT_RETRYABLE_CODES: [Code; 3] =
    [Code::DeadlineExceeded, Code::Aborted, Code::Unavailable];

/// Retry budget and backoff schedule for a read.
///
/// Every resumption counts against `max_retries`, no matter how many rows the broken attempt
/// delivered. Delays grow exponentially from `initial_backoff` by `multiplier`, are capped at
/// `max_backoff`, and are jittered uniformly over `[0, delay]`.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of resumptions after the initial attempt.
    max_retries: u32,
    /// Delay ceiling before the first resumption.
    initial_backoff: Duration,
    /// Upper bound of any delay.
    max_backoff: Duration,
    /// Growth factor applied per attempt.
    multiplier: f64,
    /// Status codes that trigger a resumption.
    retryable_codes: Vec<Code>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_READ_RETRY_COUNT,
            initial_backoff: Duration::from_millis(10),
            max_backoff: Duration::from_secs(1),
            multiplier: 2.0,
            retryable_codes: DEFAULT_RETRYABLE_CODES.to_vec(),
        }
    }
}

impl RetryPolicy {
    /// A policy that never resumes.
    #[inline]
    pub fn no_retries() -> Self {
        Self::default().with_max_retries(0)
    }

    /// Set the maximum number of resumptions. Zero disables retries.
    #[must_use]
    #[inline]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the delay ceiling before the first resumption.
    #[must_use]
    #[inline]
    pub const fn with_initial_backoff(mut self, initial_backoff: Duration) -> Self {
        self.initial_backoff = initial_backoff;
        self
    }

    /// Set the upper bound of any delay.
    #[must_use]
    #[inline]
    pub const fn with_max_backoff(mut self, max_backoff: Duration) -> Self {
        self.max_backoff = max_backoff;
        self
    }

    /// Set the growth factor of the delay. Values below 1 are treated as 1.
    #[must_use]
    #[inline]
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier.max(1.0);
        self
    }

    /// Replace the set of status codes that trigger a resumption.
    #[must_use]
    pub fn with_retryable_codes(mut self, codes: impl IntoIterator<Item = Code>) -> Self {
        self.retryable_codes = codes.into_iter().collect();
        self
    }

    /// The maximum number of resumptions.
    #[inline]
    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Whether a stream that failed with `code` may be resumed.
    #[inline]
    pub fn is_retryable(&self, code: Code) -> bool {
        self.retryable_codes.contains(&code)
    }

    /// Whether another resumption is allowed after `retries` have already been made.
    #[inline]
    pub const fn may_retry(&self, retries: u32) -> bool {
        retries < self.max_retries
    }

    /// The longest delay before resumption number `retry` (starting at zero).
    pub fn backoff_ceiling(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let ceiling = self.initial_backoff.as_secs_f64() * self.multiplier.powi(exponent);
        let max = self.max_backoff.as_secs_f64();
        if ceiling.is_finite() && ceiling < max {
            Duration::from_secs_f64(ceiling)
        } else {
            self.max_backoff
        }
    }

    /// The jittered delay before resumption number `retry` (starting at zero).
    pub fn backoff(&self, retry: u32) -> Duration {
        let ceiling = self.backoff_ceiling(retry);
        if ceiling.is_zero() {
            return ceiling;
        }
        rand::thread_rng().gen_range(Duration::ZERO..=ceiling)
    }
}
