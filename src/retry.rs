use std::future::Future;

use anyhow::{Result, anyhow};
use tokio::time::{Duration, sleep};
use tokio_util::sync::CancellationToken;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(2);

/// Bounded retry: at most `max_attempts` tries with a fixed `backoff`
/// between consecutive failures. A policy with zero attempts still tries once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,

    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: DEFAULT_BACKOFF,
        }
    }
}

#[derive(Debug)]
pub enum RetryOutcome<T> {
    Succeeded { value: T, attempts: u32 },

    Exhausted { attempts: u32, last_error: anyhow::Error },

    /// The token fired; `attempts` includes the interrupted attempt, if any.
    Cancelled { attempts: u32 },
}

impl RetryPolicy {
    /// Runs `operation` until it succeeds, the attempts run out, or `token`
    /// is cancelled. The operation receives the 1-based attempt number.
    pub async fn run<T, F, Fut>(
        &self,
        token: &CancellationToken,
        mut operation: F,
    ) -> RetryOutcome<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut last_error = anyhow!("no attempt was made");

        for attempt in 1..=max_attempts {
            let result = tokio::select! {
                biased;
                _ = token.cancelled() => return RetryOutcome::Cancelled { attempts: attempt },
                result = operation(attempt) => result,
            };

            match result {
                Ok(value) => {
                    return RetryOutcome::Succeeded {
                        value,
                        attempts: attempt,
                    };
                }
                Err(err) => last_error = err,
            }

            if attempt < max_attempts {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => return RetryOutcome::Cancelled { attempts: attempt },
                    _ = sleep(self.backoff) => {}
                }
            }
        }

        RetryOutcome::Exhausted {
            attempts: max_attempts,
            last_error,
        }
    }
}
