//! Run settings for the reconciler.

use std::time::Duration;

/// Bounded retry schedule for provider calls.
///
/// Applied only to errors whose [`membership::RetryPolicy`] is retryable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget {
    /// Total attempts per call, including the first. At least 1.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubled for each later attempt.
    pub initial_backoff: Duration,
    /// Upper bound for any single delay, including server-requested ones.
    pub max_backoff: Duration,
}

impl RetryBudget {
    /// A budget that never retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay before attempt `attempt + 1`, given that `attempt` just failed.
    ///
    /// The exponential schedule is raised to `hint` when the provider asked
    /// for a longer wait, and the result is capped at `max_backoff`.
    pub fn delay_after(&self, attempt: u32, hint: Option<Duration>) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let scheduled = self.initial_backoff.saturating_mul(1 << exponent);
        let wanted = hint.map_or(scheduled, |h| h.max(scheduled));
        wanted.min(self.max_backoff)
    }
}

impl Default for RetryBudget {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(8),
        }
    }
}

/// Settings for one [`crate::Reconciler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilerConfig {
    /// Retry schedule for membership reads and invitation calls.
    pub retry: RetryBudget,
    /// Maximum contributors processed at once. 1 processes sequentially.
    pub concurrency: usize,
    /// Wall-clock limit for the whole run. Contributors unresolved when it
    /// passes are reported as transient failures.
    pub run_timeout: Option<Duration>,
    /// Read membership but issue no invitations.
    pub dry_run: bool,
}

impl ReconcilerConfig {
    #[must_use]
    pub fn with_retry(mut self, retry: RetryBudget) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    #[must_use]
    pub fn with_run_timeout(mut self, timeout: Duration) -> Self {
        self.run_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            retry: RetryBudget::default(),
            concurrency: 4,
            run_timeout: None,
            dry_run: false,
        }
    }
}
