//! Fixed-size worker pool
//!
//! Units of work are submitted as one batch and the caller blocks until every
//! unit has finished. Results come back as a collected sequence in submission
//! order; there is no streaming, cancellation or timeout. A panicking unit
//! propagates to the caller and aborts the run.

use std::sync::Arc;

use indicatif::ProgressBar;
use rayon::prelude::*;
use tracing::debug;

use crate::probe::{ExecutionGate, LockProbe};
use crate::Result;

/// Worker pool sharing one execution gate across its threads
pub struct WorkerPool {
    pool: rayon::ThreadPool,
    gate: Arc<ExecutionGate>,
    workers: usize,
    progress: Option<ProgressBar>,
}

impl WorkerPool {
    pub fn new(workers: usize, gate: Arc<ExecutionGate>) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("lockbench-worker-{}", i))
            .build()?;

        debug!(workers, global_lock = gate.global_lock_active(), "worker pool ready");
        Ok(Self {
            pool,
            gate,
            workers,
            progress: None,
        })
    }

    /// Advance `bar` once per completed unit
    pub fn with_progress(mut self, bar: ProgressBar) -> Self {
        self.progress = Some(bar);
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn gate(&self) -> &ExecutionGate {
        &self.gate
    }

    /// Run `f` once per item on the pool and join on all of them
    pub fn map<T, R, F>(&self, items: Vec<T>, f: F) -> Vec<R>
    where
        T: Send,
        R: Send,
        F: Fn(&ExecutionGate, T) -> R + Send + Sync,
    {
        let gate = self.gate.as_ref();
        let progress = self.progress.as_ref();
        self.pool.install(|| {
            items
                .into_par_iter()
                .map(|item| {
                    let result = f(gate, item);
                    if let Some(bar) = progress {
                        bar.inc(1);
                    }
                    result
                })
                .collect()
        })
    }

    /// Like [`WorkerPool::map`] for fallible units; the first error is returned
    /// after every unit has finished
    pub fn try_map<T, R, F>(&self, items: Vec<T>, f: F) -> Result<Vec<R>>
    where
        T: Send,
        R: Send,
        F: Fn(&ExecutionGate, T) -> Result<R> + Send + Sync,
    {
        self.map(items, f).into_iter().collect()
    }
}
