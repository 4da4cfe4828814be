//! The long-lived pool task that drains one owner's queue.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::task::task_tracker::TaskTrackerToken;
use tracing::trace;

use crate::pool::Task;
use crate::store::BalanceStore;
use crate::types::{Order, OwnerId};

/// Drains one owner's queue, applying each order to the store in FIFO order,
/// until the queue is closed and empty.
///
/// Holding the queue's only receiver, this task is the sole reader for its
/// owner — a second reader cannot exist. Once [`Task::run`] returns the task
/// is finished for good; it is never reused.
pub(super) struct OwnerQueueTask {
    owner: OwnerId,
    queue: mpsc::Receiver<Order>,
    store: Arc<dyn BalanceStore>,
    /// Released when the drain loop finishes; the dispatcher joins on it
    /// during shutdown.
    #[allow(dead_code)]
    drain_guard: TaskTrackerToken,
}

impl OwnerQueueTask {
    pub(super) fn new(
        owner: OwnerId,
        queue: mpsc::Receiver<Order>,
        store: Arc<dyn BalanceStore>,
        drain_guard: TaskTrackerToken,
    ) -> Self {
        OwnerQueueTask {
            owner,
            queue,
            store,
            drain_guard,
        }
    }
}

#[async_trait]
impl Task for OwnerQueueTask {
    async fn run(mut self: Box<Self>) {
        trace!(owner = %self.owner, "owner queue drain started");

        while let Some(order) = self.queue.recv().await {
            self.store.add(order.owner, order.amount);
            trace!(
                order = %order.id,
                owner = %order.owner,
                amount = order.amount,
                "order applied"
            );
        }

        trace!(owner = %self.owner, "owner queue drained");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use tokio_util::task::TaskTracker;

    #[tokio::test]
    async fn applies_buffered_orders_then_finishes() {
        let store = Arc::new(MemoryStore::new());
        let tracker = TaskTracker::new();
        let (queue_tx, queue_rx) = mpsc::channel(4);

        queue_tx.send(Order::new(1, 7, 100)).await.unwrap();
        queue_tx.send(Order::new(2, 7, 50)).await.unwrap();
        drop(queue_tx);

        let task = OwnerQueueTask::new(
            OwnerId(7),
            queue_rx,
            Arc::clone(&store) as Arc<dyn BalanceStore>,
            tracker.token(),
        );
        Box::new(task).run().await;

        // The drain guard is released once the loop finished.
        tracker.close();
        tracker.wait().await;

        assert_eq!(store.get(OwnerId(7)), Some(150));
    }
}
