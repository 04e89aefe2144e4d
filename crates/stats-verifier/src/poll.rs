//! Fixed-interval polling with an overall timeout.

use crate::error::PollError;
use std::fmt::Display;
use std::future::Future;
use tokio::time::{Duration, Instant, sleep};

/// Interval used by the stats-emitter log check.
pub const LOGS_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Interval used by the BigQuery data check.
pub const BIGQUERY_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Default upper bound for a single check.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Retry policy: try every `interval` until `timeout` has elapsed.
///
/// There is no jitter, no backoff and no attempt cap besides the timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollStrategy {
    pub interval: Duration,
    pub timeout: Duration,
}

impl PollStrategy {
    pub const fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }

    /// Repeatedly runs `check` until it reports success or the timeout elapses.
    ///
    /// One interval is waited before every attempt, including the first.
    /// `Ok(false)` and `Err(_)` both mean "not yet"; errors are logged and
    /// retried. Returns the number of attempts made on success.
    #[tracing::instrument(skip(self, check), fields(interval = ?self.interval, timeout = ?self.timeout))]
    pub async fn poll<F, Fut, E>(&self, mut check: F) -> Result<u32, PollError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<bool, E>>,
        E: Display,
    {
        let started = Instant::now();
        let mut attempts = 0u32;
        let mut last_error = None;

        loop {
            sleep(self.interval).await;
            attempts += 1;

            match check().await {
                Ok(true) => return Ok(attempts),
                Ok(false) => {
                    tracing::debug!(
                        name = "poll.attempt.unsatisfied",
                        target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                        attempt = attempts,
                        message = "condition not met yet"
                    );
                }
                Err(error) => {
                    tracing::warn!(
                        name = "poll.attempt.failed",
                        target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                        attempt = attempts,
                        error = %error,
                        message = "failed with error, retrying..."
                    );
                    last_error = Some(error.to_string());
                }
            }

            if started.elapsed() >= self.timeout {
                return Err(PollError::Timeout {
                    timeout: self.timeout,
                    attempts,
                    last_error,
                });
            }
        }
    }
}
