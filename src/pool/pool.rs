//! The pool itself: worker lifecycle, task admission, shutdown.

use std::sync::{Arc, Mutex as StdMutex};

use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::info;

use super::task::Task;
use super::worker::worker_loop;

/// Errors that can occur during pool operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// Construction was attempted with a zero worker count or queue capacity.
    #[error("invalid worker pool configuration: {0}")]
    InvalidConfiguration(&'static str),

    /// The pool has been shut down and accepts no new tasks.
    #[error("worker pool is shut down")]
    Closed,
}

/// Result type for pool operations.
pub type Result<T> = std::result::Result<T, PoolError>;

/// A fixed-size pool of workers executing [`Task`]s from one shared bounded
/// queue.
///
/// The shared queue decouples producer rate from worker count; bounding it
/// provides backpressure — [`add_task`](WorkerPool::add_task) suspends once
/// the queue is full instead of growing memory without limit.
///
/// Shutdown is cooperative: [`shutdown`](WorkerPool::shutdown) stops new
/// admissions and workers drain whatever is already queued before exiting;
/// [`wait`](WorkerPool::wait) joins them.
#[derive(Debug)]
pub struct WorkerPool {
    worker_count: usize,
    /// Sender half of the shared queue. Taken (and dropped) on shutdown,
    /// which is what closes the queue.
    task_tx: StdMutex<Option<mpsc::Sender<Box<dyn Task>>>>,
    closed: CancellationToken,
    workers: TaskTracker,
}

impl WorkerPool {
    /// Creates a pool and spawns `worker_count` workers immediately.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidConfiguration`] if `worker_count` or
    /// `queue_capacity` is zero.
    pub fn new(worker_count: usize, queue_capacity: usize) -> Result<Self> {
        if worker_count == 0 {
            return Err(PoolError::InvalidConfiguration(
                "worker count must be greater than zero",
            ));
        }
        if queue_capacity == 0 {
            return Err(PoolError::InvalidConfiguration(
                "queue capacity must be greater than zero",
            ));
        }

        let (task_tx, task_rx) = mpsc::channel(queue_capacity);
        let queue = Arc::new(Mutex::new(task_rx));

        let workers = TaskTracker::new();
        for worker_id in 0..worker_count {
            workers.spawn(worker_loop(worker_id, Arc::clone(&queue)));
        }
        workers.close();

        info!(worker_count, queue_capacity, "worker pool started");

        Ok(WorkerPool {
            worker_count,
            task_tx: StdMutex::new(Some(task_tx)),
            closed: CancellationToken::new(),
            workers,
        })
    }

    /// Number of workers the pool was created with.
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Queues a task for execution, suspending while the queue is full.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Closed`] once [`shutdown`](WorkerPool::shutdown)
    /// has been called. The closed state is checked both up front and against
    /// the queue itself, so a send racing shutdown resolves to this error
    /// rather than a fault.
    pub async fn add_task(&self, task: impl Task) -> Result<()> {
        if self.closed.is_cancelled() {
            return Err(PoolError::Closed);
        }

        let task_tx = self
            .task_tx
            .lock()
            .expect("task sender lock poisoned")
            .clone();
        let Some(task_tx) = task_tx else {
            return Err(PoolError::Closed);
        };

        task_tx
            .send(Box::new(task))
            .await
            .map_err(|_| PoolError::Closed)
    }

    /// Stops task admission and closes the shared queue.
    ///
    /// Idempotent. Workers finish whatever is already queued and then exit;
    /// this method does not wait for them — see [`wait`](WorkerPool::wait).
    pub fn shutdown(&self) {
        self.closed.cancel();
        let task_tx = self
            .task_tx
            .lock()
            .expect("task sender lock poisoned")
            .take();
        if task_tx.is_some() {
            info!("worker pool shutting down");
        }
    }

    /// Completes once every worker has exited.
    ///
    /// Safe to call from any number of callers, before, during, or after
    /// [`shutdown`](WorkerPool::shutdown).
    pub async fn wait(&self) {
        self.workers.wait().await;
    }
}
