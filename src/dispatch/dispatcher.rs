//! The dispatcher: lazy owner-queue registry, submission, shutdown.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, OnceCell, RwLock};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, instrument};

use crate::pool::WorkerPool;
use crate::store::BalanceStore;
use crate::types::{Order, OwnerId};

use super::owner_task::OwnerQueueTask;

/// Errors surfaced by dispatcher operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// Shutdown has begun; the order was not accepted and no balance changed.
    #[error("order dispatcher is shut down")]
    Shutdown,
}

/// Result type for dispatcher operations.
pub type Result<T> = std::result::Result<T, DispatchError>;

/// Default bound for each owner's queue.
const DEFAULT_OWNER_QUEUE_CAPACITY: usize = 100;

/// Configuration for the dispatcher.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Capacity of each per-owner queue. Values below 1 are clamped to 1 at
    /// queue creation (bounded channels cannot be zero-sized).
    pub owner_queue_capacity: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        DispatcherConfig {
            owner_queue_capacity: DEFAULT_OWNER_QUEUE_CAPACITY,
        }
    }
}

impl DispatcherConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the per-owner queue capacity.
    pub fn with_owner_queue_capacity(mut self, capacity: usize) -> Self {
        self.owner_queue_capacity = capacity;
        self
    }
}

/// Routes orders to per-owner queues and coordinates global shutdown.
///
/// # Ordering
///
/// For a fixed owner, orders are applied in exactly the order their
/// [`submit`](Dispatcher::submit) calls were accepted; across owners nothing
/// is ordered. Each queue's receiving half is moved into its drain task, so
/// the single-reader-per-owner invariant holds by construction.
///
/// # Lifecycle
///
/// Open → shutting down → closed, one way. `submit` fails with
/// [`DispatchError::Shutdown`] as soon as shutdown begins, and
/// [`shutdown`](Dispatcher::shutdown) returns only after every accepted
/// order has been applied and the pool has stopped.
///
/// # Sizing
///
/// Drain tasks occupy a pool worker for the dispatcher's lifetime. Size the
/// pool with at least as many workers as concurrently active owners, or
/// later owners' queues will not make progress until shutdown.
pub struct Dispatcher {
    config: DispatcherConfig,
    store: Arc<dyn BalanceStore>,
    pool: Arc<WorkerPool>,
    /// Owner-queue registry. Entries are only ever added during normal
    /// operation; the map is emptied as the closing step of shutdown.
    queues: RwLock<HashMap<OwnerId, mpsc::Sender<Order>>>,
    shutdown: CancellationToken,
    /// Joins every drain task during shutdown.
    drains: TaskTracker,
    shutdown_done: OnceCell<()>,
}

impl Dispatcher {
    pub fn new(
        config: DispatcherConfig,
        store: Arc<dyn BalanceStore>,
        pool: Arc<WorkerPool>,
    ) -> Self {
        Dispatcher {
            config,
            store,
            pool,
            queues: RwLock::new(HashMap::new()),
            shutdown: CancellationToken::new(),
            drains: TaskTracker::new(),
            shutdown_done: OnceCell::new(),
        }
    }

    /// Submits an order for processing.
    ///
    /// Suspends while the owner's queue is full. The enqueue races the
    /// shutdown signal: whichever wins determines the outcome, and an order
    /// reported accepted is guaranteed to be applied before
    /// [`shutdown`](Dispatcher::shutdown) returns.
    ///
    /// # Errors
    ///
    /// [`DispatchError::Shutdown`] once shutdown has begun, or when the pool
    /// refused the owner's drain task because it is itself stopping. Either
    /// way the order was not accepted and no balance changed.
    #[instrument(skip(self, order), fields(owner = %order.owner, order = %order.id))]
    pub async fn submit(&self, order: Order) -> Result<()> {
        if self.shutdown.is_cancelled() {
            return Err(DispatchError::Shutdown);
        }

        let queue = self.owner_queue(order.owner).await?;

        tokio::select! {
            // Poll the send first so a completed enqueue is always reported
            // as accepted.
            biased;
            sent = queue.send(order) => sent.map_err(|_| DispatchError::Shutdown),
            () = self.shutdown.cancelled() => Err(DispatchError::Shutdown),
        }
    }

    /// Returns the owner's queue, creating and registering it (and its drain
    /// task) on first sight of the owner.
    async fn owner_queue(&self, owner: OwnerId) -> Result<mpsc::Sender<Order>> {
        // Fast path: the queue already exists (read lock only).
        {
            let queues = self.queues.read().await;
            if let Some(queue) = queues.get(&owner) {
                return Ok(queue.clone());
            }
        }

        let mut queues = self.queues.write().await;

        // Shutdown closes queues under this lock; re-checking here means no
        // queue can be created after that pass has run.
        if self.shutdown.is_cancelled() {
            return Err(DispatchError::Shutdown);
        }
        // Double-check: another submit may have created the queue while we
        // waited for the write lock.
        if let Some(queue) = queues.get(&owner) {
            return Ok(queue.clone());
        }

        let capacity = self.config.owner_queue_capacity.max(1);
        debug!(owner = %owner, capacity, "creating owner queue");

        let (queue_tx, queue_rx) = mpsc::channel(capacity);
        let task = OwnerQueueTask::new(
            owner,
            queue_rx,
            Arc::clone(&self.store),
            self.drains.token(),
        );

        // The pool enqueue can itself suspend on backpressure; race it
        // against shutdown so this registry lock is never held forever.
        let accepted = tokio::select! {
            biased;
            result = self.pool.add_task(task) => result.is_ok(),
            () = self.shutdown.cancelled() => false,
        };
        if !accepted {
            // The fresh queue is dropped unregistered; the caller sees the
            // same error as any post-shutdown submit.
            return Err(DispatchError::Shutdown);
        }

        queues.insert(owner, queue_tx.clone());
        Ok(queue_tx)
    }

    /// Shuts the dispatcher down and drains everything already accepted.
    ///
    /// Idempotent; concurrent callers all wait for the single execution.
    /// Sequence: signal shutdown (resolving in-flight submits), close every
    /// owner queue, join every drain task, then stop and join the pool.
    pub async fn shutdown(&self) {
        self.shutdown_done
            .get_or_init(|| async {
                info!("dispatcher shutting down");
                self.shutdown.cancel();

                // Dropping the registered senders closes each owner queue;
                // a sender cloned by an in-flight submit keeps its queue
                // open only until that submit resolves.
                self.queues.write().await.clear();

                self.drains.close();
                self.drains.wait().await;

                self.pool.shutdown();
                self.pool.wait().await;
                info!("dispatcher shutdown complete");
            })
            .await;
    }

    /// Reads the owner's balance straight from the store.
    pub fn balance(&self, owner: OwnerId) -> Option<i64> {
        self.store.get(owner)
    }

    /// Number of owner queues currently registered.
    pub async fn active_owner_queues(&self) -> usize {
        self.queues.read().await.len()
    }

    /// Whether a queue exists for the given owner.
    pub async fn has_owner_queue(&self, owner: OwnerId) -> bool {
        self.queues.read().await.contains_key(&owner)
    }
}
