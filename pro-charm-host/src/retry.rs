//! Fixed-schedule retry for flaky external calls.

use std::fmt::Display;
use std::time::Duration;

/// Delays between attempts. The number of delays is also the attempt budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    delays: Vec<Duration>,
}

impl Default for RetryPolicy {
    /// 0.5s, 1s, 2s.
    fn default() -> Self {
        Self::new(vec![
            Duration::from_millis(500),
            Duration::from_secs(1),
            Duration::from_secs(2),
        ])
    }
}

impl RetryPolicy {
    pub fn new(delays: Vec<Duration>) -> Self {
        Self { delays }
    }

    /// `attempts` tries with no sleeping in between.
    pub fn immediate(attempts: usize) -> Self {
        Self::new(vec![Duration::ZERO; attempts])
    }

    /// Total number of attempts; an empty schedule still runs once.
    pub fn attempts(&self) -> usize {
        self.delays.len().max(1)
    }
}

/// Call `op` until it succeeds, fails with an error `is_retryable` rejects, or
/// the policy runs out of attempts.
///
/// After failed attempt `i` (with attempts remaining) a warning is logged and
/// the thread sleeps for `delays[i]`. The last error is returned unchanged.
pub fn retry_if<T, E, F, P>(policy: &RetryPolicy, is_retryable: P, op: F) -> Result<T, E>
where
    F: FnMut() -> Result<T, E>,
    P: Fn(&E) -> bool,
    E: Display,
{
    retry_with_sleep(policy, is_retryable, op, std::thread::sleep)
}

pub(crate) fn retry_with_sleep<T, E, F, P, S>(
    policy: &RetryPolicy,
    is_retryable: P,
    mut op: F,
    mut sleep: S,
) -> Result<T, E>
where
    F: FnMut() -> Result<T, E>,
    P: Fn(&E) -> bool,
    E: Display,
    S: FnMut(Duration),
{
    let attempts = policy.attempts();
    let mut attempt = 0;
    loop {
        let err = match op() {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        attempt += 1;
        let remaining = attempts.saturating_sub(attempt);
        if remaining == 0 || !is_retryable(&err) {
            return Err(err);
        }
        tracing::warn!("{err}: Retrying {remaining} more times.");
        let delay = policy
            .delays
            .get(attempt - 1)
            .copied()
            .unwrap_or_default();
        sleep(delay);
    }
}
