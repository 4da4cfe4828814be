//! Aggregate balance store keyed by owner.
//!
//! The store is the dispatch layer's only collaborator: a thread-safe
//! accumulator mapping owners to running totals. Drain tasks call
//! [`BalanceStore::add`] concurrently from pool workers while callers read
//! through [`BalanceStore::get`], so implementations must be safe under
//! unsynchronized concurrent use.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::types::OwnerId;

/// Thread-safe owner-keyed accumulator.
pub trait BalanceStore: Send + Sync {
    /// Returns the owner's balance, or `None` if no order has ever been
    /// applied for them.
    fn get(&self, owner: OwnerId) -> Option<i64>;

    /// Adds `delta` to the owner's balance, creating the entry at `delta` if
    /// absent.
    ///
    /// Infallible by contract: implementations must resolve internal failures
    /// themselves — the drain layer has no retry or report path.
    fn add(&self, owner: OwnerId, delta: i64);
}

/// In-memory store backed by a read-write lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    balances: RwLock<HashMap<OwnerId, i64>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BalanceStore for MemoryStore {
    fn get(&self, owner: OwnerId) -> Option<i64> {
        let balances = self.balances.read().expect("balance lock poisoned");
        balances.get(&owner).copied()
    }

    fn add(&self, owner: OwnerId, delta: i64) {
        let mut balances = self.balances.write().expect("balance lock poisoned");
        let balance = balances.entry(owner).or_insert(0);
        *balance = balance.saturating_add(delta);
    }
}
