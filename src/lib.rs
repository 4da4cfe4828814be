//! Concurrent order application with strict per-owner ordering.
//!
//! Orders for different owners are applied concurrently through a fixed-size
//! worker pool; orders for the same owner flow through one bounded FIFO queue
//! and apply in submission order. Shutdown drains every accepted order before
//! returning.

pub mod dispatch;
pub mod pool;
pub mod store;
pub mod types;
