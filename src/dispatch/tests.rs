//! End-to-end scenarios for the dispatch layer.
//!
//! These exercise the full path — submit → owner queue → drain task on a
//! pool worker → store — under concurrency, and pin down the drain
//! guarantees around shutdown.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::timeout;

use crate::pool::WorkerPool;
use crate::store::{BalanceStore, MemoryStore};
use crate::types::{Order, OwnerId};

use super::{DispatchError, Dispatcher, DispatcherConfig};

// ─── Test helpers ───

fn order(id: u64, owner: u64, amount: i64) -> Order {
    Order::new(id, owner, amount)
}

fn new_dispatcher(workers: usize, pool_capacity: usize) -> (Arc<Dispatcher>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let pool = Arc::new(WorkerPool::new(workers, pool_capacity).expect("valid pool configuration"));
    let dispatcher = Dispatcher::new(
        DispatcherConfig::default(),
        Arc::clone(&store) as Arc<dyn BalanceStore>,
        pool,
    );
    (Arc::new(dispatcher), store)
}

/// Store double that records every application, for observing order.
#[derive(Default)]
struct RecordingStore {
    applied: Mutex<Vec<(OwnerId, i64)>>,
}

impl RecordingStore {
    fn applied_for(&self, owner: OwnerId) -> Vec<i64> {
        self.applied
            .lock()
            .unwrap()
            .iter()
            .filter(|(o, _)| *o == owner)
            .map(|(_, amount)| *amount)
            .collect()
    }
}

impl BalanceStore for RecordingStore {
    fn get(&self, owner: OwnerId) -> Option<i64> {
        let applied = self.applied.lock().unwrap();
        let amounts: Vec<i64> = applied
            .iter()
            .filter(|(o, _)| *o == owner)
            .map(|(_, amount)| *amount)
            .collect();
        if amounts.is_empty() {
            None
        } else {
            Some(amounts.iter().sum())
        }
    }

    fn add(&self, owner: OwnerId, delta: i64) {
        self.applied.lock().unwrap().push((owner, delta));
    }
}

// ─── Cross-owner isolation ───

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_mixed_owners_settle_to_correct_balances() {
    let (dispatcher, store) = new_dispatcher(5, 100);

    let orders = vec![
        order(1, 1, 100),
        order(2, 2, 200),
        order(3, 1, 50),
        order(4, 3, 300),
    ];
    let mut handles = Vec::new();
    for o in orders {
        let dispatcher = Arc::clone(&dispatcher);
        handles.push(tokio::spawn(async move { dispatcher.submit(o).await }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    dispatcher.shutdown().await;

    assert_eq!(store.get(OwnerId(1)), Some(150));
    assert_eq!(store.get(OwnerId(2)), Some(200));
    assert_eq!(store.get(OwnerId(3)), Some(300));
    assert_eq!(store.get(OwnerId(4)), None);
}

#[tokio::test(flavor = "multi_thread")]
async fn high_concurrency_loses_no_orders() {
    let (dispatcher, store) = new_dispatcher(20, 1000);

    let owners = 50u64;
    let orders_per_owner = 100u64;

    let mut handles = Vec::new();
    for owner in 1..=owners {
        for i in 1..=orders_per_owner {
            let dispatcher = Arc::clone(&dispatcher);
            handles.push(tokio::spawn(async move {
                dispatcher.submit(order(owner * 1_000 + i, owner, i as i64)).await
            }));
        }
    }
    for handle in handles {
        handle.await.unwrap().expect("submit before shutdown succeeds");
    }

    dispatcher.shutdown().await;

    let expected = (orders_per_owner * (orders_per_owner + 1) / 2) as i64;
    for owner in 1..=owners {
        assert_eq!(store.get(OwnerId(owner)), Some(expected), "owner {owner}");
    }
}

// ─── Per-owner ordering ───

#[tokio::test(flavor = "multi_thread")]
async fn orders_for_one_owner_apply_in_submission_order() {
    let store = Arc::new(RecordingStore::default());
    let pool = Arc::new(WorkerPool::new(4, 64).unwrap());
    let dispatcher = Arc::new(Dispatcher::new(
        DispatcherConfig::new().with_owner_queue_capacity(8),
        Arc::clone(&store) as Arc<dyn BalanceStore>,
        pool,
    ));

    // Noise on three other owners while owner 7 submits sequentially.
    let noise = {
        let dispatcher = Arc::clone(&dispatcher);
        tokio::spawn(async move {
            for i in 1..=100u64 {
                let _ = dispatcher.submit(order(10_000 + i, 1 + (i % 3), 1)).await;
            }
        })
    };

    for i in 1..=200u64 {
        dispatcher.submit(order(i, 7, i as i64)).await.unwrap();
    }
    noise.await.unwrap();

    dispatcher.shutdown().await;

    let applied = store.applied_for(OwnerId(7));
    let expected: Vec<i64> = (1..=200).collect();
    assert_eq!(applied, expected);
}

// ─── Shutdown semantics ───

#[tokio::test(flavor = "multi_thread")]
async fn shutdown_applies_every_accepted_order() {
    let (dispatcher, store) = new_dispatcher(4, 64);
    let accepted = Arc::new(AtomicI64::new(0));

    let submitter = {
        let dispatcher = Arc::clone(&dispatcher);
        let accepted = Arc::clone(&accepted);
        tokio::spawn(async move {
            for i in 1..=5_000u64 {
                match dispatcher.submit(order(i, 42, 1)).await {
                    Ok(()) => {
                        accepted.fetch_add(1, Ordering::SeqCst);
                    }
                    Err(DispatchError::Shutdown) => break,
                }
            }
        })
    };

    // Let some submissions through, then shut down mid-stream.
    tokio::time::sleep(Duration::from_millis(10)).await;
    dispatcher.shutdown().await;
    submitter.await.unwrap();

    let balance = store.get(OwnerId(42)).unwrap_or(0);
    assert_eq!(balance, accepted.load(Ordering::SeqCst));
}

#[tokio::test]
async fn submit_after_shutdown_is_rejected() {
    let (dispatcher, store) = new_dispatcher(2, 10);
    dispatcher.shutdown().await;

    let err = dispatcher.submit(order(1, 1, 100)).await.unwrap_err();
    assert_eq!(err, DispatchError::Shutdown);
    assert_eq!(store.get(OwnerId(1)), None);
    assert_eq!(dispatcher.balance(OwnerId(1)), None);
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_shutdowns_are_idempotent() {
    let (dispatcher, store) = new_dispatcher(4, 32);
    for i in 1..=10 {
        dispatcher.submit(order(i, 3, 10)).await.unwrap();
    }

    let mut handles = Vec::new();
    for _ in 0..4 {
        let dispatcher = Arc::clone(&dispatcher);
        handles.push(tokio::spawn(async move { dispatcher.shutdown().await }));
    }
    for handle in handles {
        timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();
    }

    // Again, after the fact.
    dispatcher.shutdown().await;
    assert_eq!(store.get(OwnerId(3)), Some(100));
}

#[tokio::test]
async fn balance_reads_through_to_store() {
    let (dispatcher, store) = new_dispatcher(2, 10);

    store.add(OwnerId(11), 250);
    assert_eq!(dispatcher.balance(OwnerId(11)), Some(250));
    assert_eq!(dispatcher.balance(OwnerId(12)), None);

    dispatcher.shutdown().await;
}
