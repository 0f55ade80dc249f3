//! Time-bounded retry with exponential backoff for discount code creation.
//!
//! Creation is the only retried operation: a freshly referenced cart discount
//! can lag behind on the platform for a few seconds, so retryable failures
//! are retried within a fixed window instead of a fixed attempt count.

use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult};

/// Retry policy bounded by wall-clock time.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total window during which attempts may be made.
    pub window: Duration,
    /// Base delay for exponential backoff.
    pub base_delay: Duration,
    /// Cap on the delay between attempts.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(60),
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(20),
        }
    }
}

impl RetryPolicy {
    /// Create a new retry policy with the given window and base delay.
    /// The delay cap defaults to 20 seconds.
    #[must_use]
    pub fn new(window: Duration, base_delay: Duration) -> Self {
        Self {
            window,
            base_delay,
            max_delay: Duration::from_secs(20),
        }
    }

    /// Whether the error is worth another attempt at all. The time window
    /// is enforced by [`RetryPolicy::execute`], not here.
    #[must_use]
    pub fn should_retry(&self, error: &ApiError) -> bool {
        error.is_retryable()
    }

    /// Delay before the next attempt, `min(base_delay * 2^attempt, max_delay)`.
    ///
    /// A rate-limit response with a `Retry-After` value uses that value
    /// directly, capped at `max_delay`.
    #[must_use]
    pub fn delay_for(&self, attempt: u32, error: &ApiError) -> Duration {
        if let ApiError::RateLimited {
            retry_after: Some(retry_after),
        } = error
        {
            return (*retry_after).min(self.max_delay);
        }
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.max_delay)
    }

    /// Execute an async operation, retrying retryable errors until the
    /// window closes.
    ///
    /// Non-retryable errors return immediately. When the window closes the
    /// last error is wrapped in [`ApiError::RetriesExhausted`].
    pub async fn execute<F, Fut, T>(&self, operation_name: &str, mut f: F) -> ApiResult<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = ApiResult<T>>,
    {
        let started = Instant::now();
        let mut attempt: u32 = 0;
        loop {
            match f().await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!(
                            operation = operation_name,
                            attempt = attempt + 1,
                            "Operation succeeded after retries"
                        );
                    }
                    return Ok(value);
                }
                Err(error) => {
                    if !self.should_retry(&error) {
                        return Err(error);
                    }

                    let delay = self.delay_for(attempt, &error);
                    let elapsed = started.elapsed();
                    if elapsed + delay >= self.window {
                        warn!(
                            operation = operation_name,
                            attempts = attempt + 1,
                            elapsed_secs = elapsed.as_secs(),
                            error = %error,
                            "Retry window exhausted"
                        );
                        return Err(ApiError::RetriesExhausted {
                            attempts: attempt + 1,
                            elapsed,
                            message: format!("{operation_name} kept failing: {error}"),
                        });
                    }

                    debug!(
                        operation = operation_name,
                        attempt = attempt + 1,
                        delay_secs = delay.as_secs(),
                        error = %error,
                        "Retrying after retryable error"
                    );

                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
