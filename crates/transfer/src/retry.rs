//! Generic concurrent retry executor.
//!
//! Every pending operation of a round is dispatched together and the round
//! always settles completely before anything is decided. Successes land in
//! an index-addressed results vector owned by the invocation; only the
//! failed indices are carried into the next round.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use futures_util::future::join_all;
use tracing::{debug, warn};

/// Classifies failures for the executor.
///
/// Non-retryable failures stop the executor once the current round has
/// settled; retrying a structurally wrong request cannot succeed.
pub trait RetryableError: fmt::Display {
    fn is_retryable(&self) -> bool {
        true
    }
}

/// Round budget and soft throttle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of rounds, including the first. Zero is treated as one.
    pub max_rounds: u32,
    /// Operations dispatched back to back before a pause is inserted.
    pub throttle_batch: usize,
    /// Pause inserted after every `throttle_batch` operations of a round.
    pub throttle_pause: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_rounds: 3,
            throttle_batch: 30,
            throttle_pause: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryErrorKind {
    /// The round budget ran out with failures remaining.
    Exhausted,
    /// An operation failed with a non-retryable error.
    Fatal,
}

/// Executor failure. Results gathered before the failure are kept.
#[derive(Debug)]
pub struct RetryError<T, E> {
    pub kind: RetryErrorKind,
    /// Failure reason from the last round that had one.
    pub last_error: E,
    /// Per-index results; `None` where the operation never succeeded.
    pub partial: Vec<Option<T>>,
    /// Rounds actually run.
    pub rounds: u32,
}

impl<T, E> RetryError<T, E> {
    /// Indices that never produced a result.
    pub fn failed_indices(&self) -> Vec<usize> {
        self.partial
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.is_none().then_some(i))
            .collect()
    }

    pub fn into_partial(self) -> Vec<Option<T>> {
        self.partial
    }
}

impl<T, E: fmt::Display> fmt::Display for RetryError<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            RetryErrorKind::Exhausted => write!(
                f,
                "retries exhausted after {} rounds: {}",
                self.rounds, self.last_error
            ),
            RetryErrorKind::Fatal => write!(
                f,
                "non-retryable failure in round {}: {}",
                self.rounds, self.last_error
            ),
        }
    }
}

impl<T: fmt::Debug, E: std::error::Error + 'static> std::error::Error for RetryError<T, E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.last_error)
    }
}

/// Runs a fixed set of independent async operations to completion.
#[derive(Debug, Clone, Default)]
pub struct RetryExecutor {
    policy: RetryPolicy,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Runs operations `0..len`, where `op(i)` builds a fresh attempt for
    /// index `i`. Returns results in index order regardless of completion
    /// order.
    pub async fn run<T, E, F, Fut>(&self, len: usize, mut op: F) -> Result<Vec<T>, RetryError<T, E>>
    where
        F: FnMut(usize) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: RetryableError,
    {
        let mut results: Vec<Option<T>> = (0..len).map(|_| None).collect();
        let mut pending: Vec<usize> = (0..len).collect();
        let mut last_error: Option<E> = None;
        let max_rounds = self.policy.max_rounds.max(1);
        let batch = self.policy.throttle_batch.max(1);
        let pause = self.policy.throttle_pause;

        let mut round = 0;
        while !pending.is_empty() && round < max_rounds {
            round += 1;
            debug!(round, pending = pending.len(), "dispatching round");

            let attempts: Vec<_> = pending
                .iter()
                .enumerate()
                .map(|(position, &index)| {
                    let delay = pause * (position / batch) as u32;
                    let attempt = op(index);
                    async move {
                        if !delay.is_zero() {
                            tokio::time::sleep(delay).await;
                        }
                        (index, attempt.await)
                    }
                })
                .collect();

            let mut failed = Vec::new();
            let mut fatal = None;
            for (index, outcome) in join_all(attempts).await {
                match outcome {
                    Ok(value) => results[index] = Some(value),
                    Err(e) if !e.is_retryable() => {
                        warn!(round, index, error = %e, "non-retryable failure");
                        fatal.get_or_insert(e);
                    }
                    Err(e) => {
                        failed.push(index);
                        last_error = Some(e);
                    }
                }
            }

            if let Some(e) = fatal {
                return Err(RetryError {
                    kind: RetryErrorKind::Fatal,
                    last_error: e,
                    partial: results,
                    rounds: round,
                });
            }

            if !failed.is_empty() {
                warn!(
                    round,
                    failed = failed.len(),
                    remaining_rounds = max_rounds - round,
                    "round had failures"
                );
            }
            pending = failed;
        }

        match (pending.is_empty(), last_error) {
            (false, Some(e)) => Err(RetryError {
                kind: RetryErrorKind::Exhausted,
                last_error: e,
                partial: results,
                rounds: round,
            }),
            _ => Ok(results.into_iter().flatten().collect()),
        }
    }
}
