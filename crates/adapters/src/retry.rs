// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded exponential backoff with full jitter.
//!
//! Retry budgets are expressed in total elapsed time, not attempt count:
//! a slow network must not let a worker spin forever past its own
//! attempt timeout.

use std::future::Future;
use std::time::Duration;

use rand::Rng;

#[derive(Debug, Clone)]
pub struct BackoffConfig {
    /// Delay before the first retry; doubles each attempt.
    pub base: Duration,
    /// Cap on any single delay.
    pub max: Duration,
    /// Total elapsed-time budget across all retries.
    pub budget: Duration,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(500),
            max: Duration::from_secs(30),
            budget: Duration::from_secs(300),
        }
    }
}

impl BackoffConfig {
    /// Compact budget for tests.
    pub fn fast() -> Self {
        Self {
            base: Duration::from_millis(1),
            max: Duration::from_millis(5),
            budget: Duration::from_millis(50),
        }
    }

    /// Full-jitter delay for a 1-indexed attempt: uniform in
    /// `[0, min(max, base * 2^(attempt-1))]`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let pow = attempt.saturating_sub(1).min(16);
        let ceiling = self.base.saturating_mul(2_u32.saturating_pow(pow)).min(self.max);
        if ceiling.is_zero() {
            return Duration::ZERO;
        }
        let millis = rand::thread_rng().gen_range(0..=ceiling.as_millis() as u64);
        Duration::from_millis(millis)
    }
}

/// Run `op` until it succeeds, the error stops being retryable, or the
/// elapsed budget runs out. Returns the last error on exhaustion.
pub async fn retry<T, E, F, Fut>(
    config: &BackoffConfig,
    is_retryable: impl Fn(&E) -> bool,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let started = tokio::time::Instant::now();
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if !is_retryable(&err) => return Err(err),
            Err(err) => {
                let delay = config.delay_for(attempt);
                if started.elapsed() + delay > config.budget {
                    return Err(err);
                }
                tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, "retrying");
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
