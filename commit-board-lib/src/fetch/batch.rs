//! Bounded-concurrency batching with inter-batch pacing.

use super::{ApiError, Clock, RetryExecutor};
use core::sync::atomic::{AtomicBool, Ordering};
use core::time::Duration;
use futures_util::future::join_all;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;

const LOG_TARGET: &str = "     batch";

pub const DEFAULT_BATCH_SIZE: usize = 5;
pub const DEFAULT_BATCH_PAUSE: Duration = Duration::from_secs(1);

/// Shared flag that stops pending batches from starting.
///
/// Work that is already in flight is never interrupted.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Runs groups of independent requests concurrently, one group at a time.
///
/// Within a group every task is driven to completion; a failure never cancels its
/// siblings. Consecutive groups are separated by a fixed pause, and results always
/// come back in input order.
#[derive(Debug, Clone)]
pub struct BatchExecutor {
    retry: RetryExecutor,
    clock: Arc<dyn Clock>,
    pause: Duration,
    cancel: CancelToken,
}

impl BatchExecutor {
    #[must_use]
    pub fn new(retry: RetryExecutor, clock: Arc<dyn Clock>, pause: Duration) -> Self {
        Self {
            retry,
            clock,
            pause,
            cancel: CancelToken::new(),
        }
    }

    /// Use `cancel` to stop pending batches.
    #[must_use]
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    #[must_use]
    pub const fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Run every request through the retry executor, `batch_size` at a time.
    ///
    /// The output holds one entry per request that was started, in input order.
    pub async fn execute_in_batches<T, F, Fut>(&self, requests: Vec<F>, batch_size: usize) -> Vec<Result<T, ApiError>>
    where
        T: Serialize + DeserializeOwned,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let retry = &self.retry;
        let tasks: Vec<_> = requests.into_iter().map(|request| move || retry.execute(request)).collect();
        self.run_batched(tasks, batch_size).await
    }

    /// Settle arbitrary tasks `batch_size` at a time.
    ///
    /// If the cancel token fires, batches that have not started yet are skipped and
    /// the returned vector is correspondingly shorter.
    pub async fn run_batched<T, F, Fut>(&self, tasks: Vec<F>, batch_size: usize) -> Vec<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let batch_size = batch_size.max(1);
        let total = tasks.len();
        let batch_count = total.div_ceil(batch_size);
        let mut results = Vec::with_capacity(total);
        let mut tasks = tasks.into_iter().peekable();
        let mut batch_index = 0usize;

        while tasks.peek().is_some() {
            if batch_index > 0 {
                if self.cancel.is_cancelled() {
                    break;
                }
                self.clock.sleep(self.pause).await;
            }

            if self.cancel.is_cancelled() {
                break;
            }

            batch_index += 1;
            let batch: Vec<Fut> = tasks.by_ref().take(batch_size).map(|task| task()).collect();
            log::debug!(target: LOG_TARGET, "Starting batch {batch_index}/{batch_count} ({} task(s))", batch.len());

            results.extend(join_all(batch).await);
        }

        if results.len() < total {
            log::info!(
                target: LOG_TARGET,
                "Batch run cancelled: {} of {total} task(s) were not started",
                total - results.len()
            );
        }

        results
    }
}
