//! The unit of work executed by the pool.

use async_trait::async_trait;

/// A unit of work the pool can execute.
///
/// Tasks are consumed by execution: [`run`](Task::run) takes ownership and
/// the task is finished for good once it returns. The pool imposes no
/// semantics beyond that; long-lived tasks (such as queue drains) simply
/// occupy a worker until they complete.
#[async_trait]
pub trait Task: Send + 'static {
    /// Executes the task to completion.
    async fn run(self: Box<Self>);
}
