//! The worker loop: pulls tasks from the shared queue until it closes.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tracing::trace;

use super::task::Task;

/// Long-lived worker body.
///
/// All workers share one receiver behind an async mutex, so each queued task
/// goes to whichever worker is free to take it. The loop exits once the
/// queue has been closed and fully drained.
pub(super) async fn worker_loop(
    worker_id: usize,
    queue: Arc<Mutex<mpsc::Receiver<Box<dyn Task>>>>,
) {
    trace!(worker_id, "worker started");

    loop {
        // Hold the lock only while waiting for the next task, never while
        // running one.
        let task = { queue.lock().await.recv().await };
        match task {
            Some(task) => task.run().await,
            None => break,
        }
    }

    trace!(worker_id, "worker stopped");
}
