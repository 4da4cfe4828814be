use std::sync::Arc;
use std::time::Instant;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use orderflow::dispatch::{Dispatcher, DispatcherConfig};
use orderflow::pool::WorkerPool;
use orderflow::store::MemoryStore;
use orderflow::types::{Order, OwnerId};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "orderflow=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let store = Arc::new(MemoryStore::new());
    let pool = Arc::new(WorkerPool::new(200, 1000).expect("pool configuration is valid"));
    let dispatcher = Dispatcher::new(DispatcherConfig::default(), store, pool);

    let started = Instant::now();

    // One hot owner taking a burst, then a spread of owners one order each.
    for i in 1..30u64 {
        if let Err(err) = dispatcher.submit(Order::new(i, 1, 100)).await {
            tracing::warn!(%err, order = i, "submit failed");
        }
    }
    for i in 1..100u64 {
        if let Err(err) = dispatcher.submit(Order::new(100 + i, i, 200)).await {
            tracing::warn!(%err, order = 100 + i, "submit failed");
        }
    }

    dispatcher.shutdown().await;
    tracing::info!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        "all accepted orders drained"
    );

    // The dispatcher is closed now; late submissions are rejected.
    if let Err(err) = dispatcher.submit(Order::new(9_999, 1, 100)).await {
        tracing::info!(%err, "late submit rejected");
    }

    if let Some(balance) = dispatcher.balance(OwnerId(1)) {
        tracing::info!(owner = 1, balance, "final balance");
    }
}
