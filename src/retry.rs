//! Retry logic with linear or exponential backoff
//!
//! Every page and count request runs through [`with_retry`]. Rate limiting
//! (429), service unavailability (503) and transport failures are retried up
//! to the configured attempt budget; any other failure is returned at once.
//!
//! # Example
//!
//! ```no_run
//! use msil_extract::retry::{IsRetryable, with_retry};
//! use msil_extract::config::RetryConfig;
//!
//! #[derive(Debug)]
//! enum MyError {
//!     Busy,
//!     Rejected,
//! }
//!
//! impl std::fmt::Display for MyError {
//!     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//!         write!(f, "{self:?}")
//!     }
//! }
//!
//! impl IsRetryable for MyError {
//!     fn is_retryable(&self) -> bool {
//!         matches!(self, MyError::Busy)
//!     }
//! }
//!
//! # async fn example() -> Result<(), MyError> {
//! let config = RetryConfig::default();
//! let value = with_retry(&config, || async { Ok::<_, MyError>(42) }).await?;
//! # Ok(())
//! # }
//! ```

use crate::config::RetryConfig;
use crate::error::{Error, TRANSIENT_STATUS_CODES};
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Trait for errors that can be classified as retryable or not
///
/// Transient failures (rate limiting, service unavailable, dropped connections)
/// return `true`. Everything else is permanent for the current request.
pub trait IsRetryable {
    /// Returns true if the error is transient and the request should be retried
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for Error {
    fn is_retryable(&self) -> bool {
        match self {
            Error::Http { status, .. } => TRANSIENT_STATUS_CODES.contains(status),
            Error::Service { .. } => self
                .status_code()
                .is_some_and(|code| TRANSIENT_STATUS_CODES.contains(&code)),
            // Builder and decode failures will fail the same way every time
            Error::Network(e) => !(e.is_builder() || e.is_decode()),
            Error::Config { .. } => false,
            Error::Serialization(_) => false,
            Error::Io(_) => false,
        }
    }
}

/// Execute an async operation, retrying transient failures
///
/// `config.max_attempts` counts every call, the first one included. Before the
/// n-th retry the task sleeps for `config.backoff.delay_for(n)`.
///
/// Returns the first success, the first non-retryable error, or the last
/// error once the attempt budget is spent.
pub async fn with_retry<F, Fut, T, E>(config: &RetryConfig, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable + std::fmt::Display,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::info!(attempts = attempt, "Request succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                let base = config.backoff.delay_for(attempt);
                let delay = if config.jitter { add_jitter(base) } else { base };

                tracing::warn!(
                    error = %e,
                    attempt = attempt,
                    max_attempts = max_attempts,
                    delay_ms = delay.as_millis(),
                    "Request failed, retrying"
                );

                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                if e.is_retryable() {
                    tracing::error!(
                        error = %e,
                        attempts = attempt,
                        "Request failed after all retry attempts exhausted"
                    );
                } else {
                    tracing::error!(error = %e, "Request failed with non-retryable error");
                }
                return Err(e);
            }
        }
    }
}

/// Add random jitter to a delay
///
/// The result lies between `delay` and `2 * delay`.
fn add_jitter(delay: Duration) -> Duration {
    let mut rng = rand::thread_rng();
    let jitter_factor: f64 = rng.gen_range(0.0..=1.0);
    Duration::from_secs_f64(delay.as_secs_f64() * (1.0 + jitter_factor))
}
