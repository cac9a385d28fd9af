//! Sharded fan-out over a fixed-size worker pool.
//!
//! The case list is cut into `workers` contiguous shards. Each shard runs on
//! its own pool thread against private state, and the per-shard results come
//! back in shard order for the caller to fold. A panicking worker aborts the
//! whole call with [`EngineError::WorkerInterrupted`].

use crate::error::EngineError;
use rayon::prelude::*;
use std::any::Any;
use std::ops::Range;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::debug;

/// Splits `len` items into exactly `workers` contiguous ranges of `ceil(len / workers)` items.
///
/// Trailing ranges may be short or empty.
pub fn partition(len: usize, workers: usize) -> Vec<Range<usize>> {
    let workers = workers.max(1);
    let shard_len = (len + workers - 1) / workers;
    (0..workers)
        .map(|shard| {
            let start = (shard * shard_len).min(len);
            let end = (start + shard_len).min(len);
            start..end
        })
        .collect()
}

fn panic_reason(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "worker panicked".to_string()
    }
}

/// Runs `work` once per shard of `items` and returns the results in shard order.
///
/// # Errors
/// `WorkerPool` if the pool cannot be built, `WorkerInterrupted` for the
/// first shard (in shard order) whose worker panicked.
pub fn fan_out<T, R, F>(items: &[T], workers: usize, work: F) -> Result<Vec<R>, EngineError>
where
    T: Sync,
    R: Send,
    F: Fn(usize, &[T]) -> R + Sync,
{
    let shards = partition(items.len(), workers);
    debug!(items = items.len(), shards = shards.len(), "fan out");

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(shards.len())
        .build()
        .map_err(|e| EngineError::WorkerPool(format!("failed to build thread pool: {}", e)))?;

    let results: Vec<Result<R, EngineError>> = pool.install(|| {
        shards
            .into_par_iter()
            .enumerate()
            .map(|(shard, range)| {
                catch_unwind(AssertUnwindSafe(|| work(shard, &items[range]))).map_err(|payload| {
                    EngineError::WorkerInterrupted {
                        shard,
                        reason: panic_reason(payload),
                    }
                })
            })
            .collect()
    });

    results.into_iter().collect()
}
