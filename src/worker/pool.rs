use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crossbeam_channel::unbounded;
use tracing::{debug, warn};

use crate::core::RunState;
use crate::worker::error::WorkerResult;
use crate::worker::task::{Indexed, TaskOutcome, restore_order};

/// Fixed-size pool that runs per-file and per-tile jobs.
///
/// Created once per run and reused for every group. The pool's queue is
/// unbounded; callers submit one group's items at a time, which bounds how
/// much work is ever queued.
pub struct WorkerPool {
    pool: rayon::ThreadPool,
    worker_count: usize,
}

impl WorkerPool {
    pub fn new(worker_count: usize) -> WorkerResult<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(worker_count)
            .thread_name(|id| format!("slicer-worker-{id}"))
            .build()?;
        debug!("Worker pool started with {} workers", worker_count);
        Ok(Self { pool, worker_count })
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Runs `job` on every item and returns one outcome per item, in input order.
    ///
    /// The cancel flag is checked before each item is submitted and again
    /// right before it starts; items seen after cancellation come back as
    /// [`TaskOutcome::Skipped`]. Jobs already running are left to finish.
    /// Blocks until every submitted job is done.
    pub fn run_indexed<T, R, F>(&self, items: Vec<T>, state: &RunState, job: F) -> Vec<TaskOutcome<R>>
    where
        T: Send,
        R: Send,
        F: Fn(T) -> R + Sync,
    {
        self.dispatch(items, Some(state), job)
    }

    /// Like [`run_indexed`](Self::run_indexed) but never skips an item.
    ///
    /// Used for the save stage, which must finish once it has started.
    pub fn run_to_completion<T, R, F>(&self, items: Vec<T>, job: F) -> Vec<TaskOutcome<R>>
    where
        T: Send,
        R: Send,
        F: Fn(T) -> R + Sync,
    {
        self.dispatch(items, None, job)
    }

    fn dispatch<T, R, F>(&self, items: Vec<T>, state: Option<&RunState>, job: F) -> Vec<TaskOutcome<R>>
    where
        T: Send,
        R: Send,
        F: Fn(T) -> R + Sync,
    {
        let total = items.len();
        let (result_tx, result_rx) = unbounded::<Indexed<TaskOutcome<R>>>();
        let job = &job;
        let cancelled = move || state.is_some_and(RunState::is_cancelled);

        self.pool.scope_fifo(|scope| {
            for (index, item) in items.into_iter().enumerate() {
                if cancelled() {
                    let _ = result_tx.send(Indexed::new(index, TaskOutcome::Skipped));
                    continue;
                }

                let result_tx = result_tx.clone();
                scope.spawn_fifo(move |_| {
                    let outcome = if cancelled() {
                        TaskOutcome::Skipped
                    } else {
                        match panic::catch_unwind(AssertUnwindSafe(|| job(item))) {
                            Ok(result) => TaskOutcome::Completed(result),
                            Err(payload) => {
                                let message = panic_message(payload.as_ref());
                                warn!("Worker job {} panicked: {}", index, message);
                                TaskOutcome::Panicked(message)
                            }
                        }
                    };
                    let _ = result_tx.send(Indexed::new(index, outcome));
                });
            }
        });
        drop(result_tx);

        let tagged: Vec<_> = result_rx.iter().collect();
        debug_assert_eq!(tagged.len(), total);
        restore_order(tagged)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
