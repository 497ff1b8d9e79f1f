//! Fixed-size worker pool for the two parallel phases.
//!
//! Both phases (field extraction and template matching) have the same shape:
//! a read-only input is cut into contiguous slices, every slice is processed
//! independently against shared immutable state, and the caller waits for all
//! of them before merging. [`run_partitioned`] implements exactly that.
//!
//! Worker count convention:
//!
//! - 0: one worker per core (rayon default)
//! - 1: run inline on the calling thread, no pool
//! - N: a dedicated pool of N threads
//!
//! A panicking worker is caught at the join barrier and reported as
//! [`LogzipError::WorkerFailure`]; partial results are never returned.

use std::panic::{self, AssertUnwindSafe};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::{LogzipError, Result};

/// Resolve the worker count convention to an actual number of workers.
pub fn effective_workers(workers: usize) -> usize {
    match workers {
        #[cfg(feature = "parallel")]
        0 => rayon::current_num_threads().max(1),
        #[cfg(not(feature = "parallel"))]
        0 => 1,
        n => n,
    }
}

/// Size of each contiguous slice when `len` items go to `workers` workers.
pub fn chunk_size(len: usize, workers: usize) -> usize {
    len / workers.max(1) + 1
}

/// Run `job` over contiguous slices of `items` and return the per-slice
/// results in slice order.
///
/// The call returns only after every slice has finished.
pub fn run_partitioned<T, R, F>(
    items: &[T],
    workers: usize,
    phase: &'static str,
    job: F,
) -> Result<Vec<R>>
where
    T: Sync,
    R: Send,
    F: Fn(&[T]) -> R + Sync,
{
    let workers = effective_workers(workers);
    if items.is_empty() {
        return Ok(Vec::new());
    }
    let chunks: Vec<&[T]> = items.chunks(chunk_size(items.len(), workers)).collect();
    log::debug!(
        "{}: {} item(s) in {} slice(s) over {} worker(s)",
        phase,
        items.len(),
        chunks.len(),
        workers
    );

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        if workers == 1 {
            return Ok(chunks.iter().map(|chunk| job(*chunk)).collect());
        }
        run_on_pool(&chunks, workers, phase, &job)
    }));

    match outcome {
        Ok(result) => result,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            log::error!("{} worker failed: {}", phase, message);
            Err(LogzipError::WorkerFailure { phase, message })
        }
    }
}

#[cfg(feature = "parallel")]
fn run_on_pool<T, R, F>(chunks: &[&[T]], workers: usize, phase: &'static str, job: &F) -> Result<Vec<R>>
where
    T: Sync,
    R: Send,
    F: Fn(&[T]) -> R + Sync,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(move |idx| format!("logzip-{}-{}", phase.replace(' ', "-"), idx))
        .build()
        .map_err(|e| LogzipError::WorkerFailure {
            phase,
            message: format!("Failed to create thread pool: {}", e),
        })?;

    Ok(pool.install(|| chunks.par_iter().map(|chunk| job(*chunk)).collect()))
}

#[cfg(not(feature = "parallel"))]
fn run_on_pool<T, R, F>(chunks: &[&[T]], _workers: usize, _phase: &'static str, job: &F) -> Result<Vec<R>>
where
    T: Sync,
    R: Send,
    F: Fn(&[T]) -> R + Sync,
{
    Ok(chunks.iter().map(|chunk| job(*chunk)).collect())
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}
