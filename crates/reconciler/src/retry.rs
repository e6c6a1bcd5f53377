//! Bounded retry around a single provider call.

use std::future::Future;

use membership::{Login, ProviderError, RetryPolicy};
use tracing::{debug, warn};

use crate::RetryBudget;

/// Result of a retried call together with the number of attempts made.
#[derive(Debug)]
pub(crate) struct Attempted<T> {
    pub result: Result<T, ProviderError>,
    pub attempts: u32,
}

/// Invokes `call` until it succeeds, returns a non-retryable error, or the
/// budget is spent. Sleeps between attempts per [`RetryBudget::delay_after`].
pub(crate) async fn with_retry<T, F, Fut>(
    budget: &RetryBudget,
    operation: &'static str,
    login: &Login,
    mut call: F,
) -> Attempted<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let max_attempts = budget.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        let error = match call().await {
            Ok(value) => {
                return Attempted {
                    result: Ok(value),
                    attempts: attempt,
                }
            }
            Err(error) => error,
        };

        let RetryPolicy::Retryable { after } = error.retry_policy() else {
            debug!(%login, operation, attempt, %error, "Provider call failed permanently");
            return Attempted {
                result: Err(error),
                attempts: attempt,
            };
        };

        if attempt >= max_attempts {
            warn!(%login, operation, attempt, %error, "Retry budget exhausted");
            return Attempted {
                result: Err(error),
                attempts: attempt,
            };
        }

        let delay = budget.delay_after(attempt, after);
        warn!(
            %login,
            operation,
            attempt,
            delay_ms = delay.as_millis() as u64,
            %error,
            "Provider call failed; retrying"
        );
        tokio::time::sleep(delay).await;
    }
}
