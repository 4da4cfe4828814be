//! Owner-partitioned order dispatch.
//!
//! Routes each submitted order into a per-owner bounded FIFO queue and
//! drains every queue through the shared worker pool, giving strict
//! per-owner ordering with cross-owner concurrency:
//!
//! ```text
//! submit ──► registry ──► owner queue (bounded FIFO) ──► drain task ──► store
//!            (lazy, one                                  (runs on a
//!             per owner)                                  pool worker)
//! ```
//!
//! Shutdown runs the picture in reverse: signal, close every owner queue,
//! join every drain task, then stop and join the pool.

mod dispatcher;
mod owner_task;

#[cfg(test)]
mod tests;

pub use dispatcher::{DispatchError, Dispatcher, DispatcherConfig, Result};
