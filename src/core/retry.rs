use std::future::Future;
use std::time::Duration;

/// How a single HTTP status is handled by the retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Success,
    /// No data exists for this request; never retried.
    Skip,
    Retryable,
    Fatal,
}

/// Result of one attempt, reported by the operation to the driver.
#[derive(Debug)]
pub enum Attempt<T> {
    Done(T),
    Skip(u16),
    Retry(String),
    Fail(String),
}

#[derive(Debug)]
pub enum RetryOutcome<T> {
    Done { value: T, attempts: u32 },
    Skipped { status: u16 },
    Failed { reason: String, attempts: u32 },
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub skip_statuses: Vec<u16>,
    pub retry_statuses: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(2))
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            skip_statuses: vec![403, 404],
            retry_statuses: vec![429, 450],
        }
    }

    pub fn classify(&self, status: u16) -> StatusClass {
        if status == 200 {
            StatusClass::Success
        } else if self.skip_statuses.contains(&status) {
            StatusClass::Skip
        } else if (500..600).contains(&status) || self.retry_statuses.contains(&status) {
            StatusClass::Retryable
        } else {
            StatusClass::Fatal
        }
    }

    /// Linear backoff: the wait after attempt `n` is `base_delay * n`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }

    /// Drives `op` until it finishes, skips, fails, or runs out of attempts.
    /// `op` receives the 1-based attempt number.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> RetryOutcome<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Attempt<T>>,
    {
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Attempt::Done(value) => {
                    return RetryOutcome::Done {
                        value,
                        attempts: attempt,
                    }
                }
                Attempt::Skip(status) => return RetryOutcome::Skipped { status },
                Attempt::Fail(reason) => {
                    return RetryOutcome::Failed {
                        reason,
                        attempts: attempt,
                    }
                }
                Attempt::Retry(reason) => {
                    if attempt >= self.max_attempts {
                        return RetryOutcome::Failed {
                            reason,
                            attempts: attempt,
                        };
                    }
                    let delay = self.delay_for(attempt);
                    tracing::debug!(
                        "🔁 {} attempt {}/{} failed ({}), retrying in {:?}",
                        label,
                        attempt,
                        self.max_attempts,
                        reason,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
