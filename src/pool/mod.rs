//! Fixed-size worker pool over a shared bounded task queue.
//!
//! The pool owns long-running workers that all pull from one bounded queue,
//! so the next task goes to whichever worker frees up first. Bounding the
//! queue gives producers backpressure instead of unbounded memory growth.
//! Shutdown stops admission and lets workers drain what is already queued;
//! [`WorkerPool::wait`] joins them.
//!
//! The pool executes any [`Task`]; it knows nothing about orders or owners.

mod pool;
mod task;
mod worker;

pub use pool::{PoolError, Result, WorkerPool};
pub use task::Task;
