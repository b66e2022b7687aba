//! Fixed-delay retry policy for the two external calls.
//!
//! The loop treats every backend failure as transient: it logs the error,
//! sleeps a constant interval, and tries again, with no attempt ceiling by
//! default. A backend that never recovers therefore stalls the process;
//! the operator interrupt is the way out. Tests cap the attempts via
//! [`RetryPolicy::with_attempt_limit`].

use std::future::Future;
use std::time::Duration;

use backoff::backoff::Backoff;
use tracing::error;

/// Constant-interval backoff with an optional cap on total tries.
#[derive(Debug, Clone)]
struct FixedDelay {
    delay: Duration,
    attempt_limit: Option<u32>,
    tried: u32,
}

impl Backoff for FixedDelay {
    fn next_backoff(&mut self) -> Option<Duration> {
        // Consulted after each failed try; `attempt_limit` counts tries, so
        // a limit of `n` allows `n - 1` sleeps.
        self.tried += 1;
        match self.attempt_limit {
            Some(limit) if self.tried >= limit => None,
            _ => Some(self.delay),
        }
    }

    fn reset(&mut self) {
        self.tried = 0;
    }
}

/// Retry policy applied around a fallible async call.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    delay: Duration,
    attempt_limit: Option<u32>,
}

impl RetryPolicy {
    /// Retry forever with a fixed delay between tries.
    pub fn fixed(delay: Duration) -> Self {
        Self {
            delay,
            attempt_limit: None,
        }
    }

    /// Cap the total number of tries. `None` restores retry-forever.
    pub fn with_attempt_limit(mut self, limit: Option<u32>) -> Self {
        self.attempt_limit = limit;
        self
    }

    /// Run `op` until it succeeds, logging each failure at error severity.
    ///
    /// Returns the last error only when an attempt limit is set and reached.
    pub async fn run<T, E, F, Fut>(&self, what: &'static str, mut op: F) -> std::result::Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: std::fmt::Display,
    {
        let policy = FixedDelay {
            delay: self.delay,
            attempt_limit: self.attempt_limit,
            tried: 0,
        };

        backoff::future::retry_notify(
            policy,
            move || {
                let fut = op();
                async move { fut.await.map_err(backoff::Error::transient) }
            },
            |err: E, delay| {
                error!(error = %err, "{what} call failed, retrying in {delay:?}");
            },
        )
        .await
    }
}
