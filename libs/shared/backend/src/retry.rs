use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::BackendError;

/// Outcome of a retried operation. `Degraded` means every attempt failed
/// with a timeout-class error; callers are expected to fall back to static
/// data instead of treating it as fatal.
#[derive(Debug)]
pub enum RetryResult<T> {
    Value(T),
    Degraded,
}

impl<T> RetryResult<T> {
    pub fn is_degraded(&self) -> bool {
        matches!(self, RetryResult::Degraded)
    }
}

/// Bounded retries with exponential backoff. Timeout-class failures wait
/// longer between attempts (the backend is known to be slow, not down) and
/// never surface as errors after exhaustion; everything else propagates.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    timeout_backoff: Duration,
    error_backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            timeout_backoff: Duration::from_secs(5),
            error_backoff: Duration::from_secs(1),
        }
    }

    /// Custom backoff bases, mainly so tests do not sleep for seconds.
    pub fn with_backoff(
        max_retries: u32,
        timeout_backoff: Duration,
        error_backoff: Duration,
    ) -> Self {
        Self {
            max_retries,
            timeout_backoff,
            error_backoff,
        }
    }

    pub async fn retry_request<T, F, Fut>(
        &self,
        mut operation: F,
    ) -> Result<RetryResult<T>, BackendError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, BackendError>>,
    {
        let mut last_error: Option<BackendError> = None;

        for attempt in 0..self.max_retries {
            match operation().await {
                Ok(value) => return Ok(RetryResult::Value(value)),
                Err(e) => {
                    warn!(
                        "Attempt {} of {} failed: {}",
                        attempt + 1,
                        self.max_retries,
                        e
                    );

                    let timeout_class = e.is_timeout_class();
                    last_error = Some(e);

                    if attempt + 1 < self.max_retries {
                        let base = if timeout_class {
                            self.timeout_backoff
                        } else {
                            self.error_backoff
                        };
                        tokio::time::sleep(base * 2u32.pow(attempt)).await;
                    }
                }
            }
        }

        match last_error {
            Some(e) if e.is_timeout_class() => {
                warn!("Retries exhausted on timeout-class error, degrading");
                Ok(RetryResult::Degraded)
            }
            Some(e) => Err(e),
            None => Err(BackendError::Other("no attempts were made".to_string())),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}
