//! Task model.
//!
//! A task is a cancellable, fallible unit of work. The executor hands every
//! task a [`CancellationToken`]; tasks that poll it can stop early, tasks
//! that ignore it run to completion (cancellation is cooperative only).
//!
//! Closures are the usual way to write a task:
//!
//! ```ignore
//! let id = executor.execute(|cancel| async move {
//!     tokio::select! {
//!         _ = cancel.cancelled() => Err("stopped".into()),
//!         _ = tokio::time::sleep(Duration::from_secs(1)) => Ok(42),
//!     }
//! })?;
//! ```
//!
//! Batch operations take [`BoxTask`]s, built with [`task`] or [`blocking`].

use super::error::{TaskError, TaskResult};
use crate::panic::catch_sync;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::fmt;
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// A unit of work submitted to the executor.
///
/// Implemented for every `FnOnce(CancellationToken) -> impl Future<Output =
/// Result<T, TaskError>>` closure that is `Send + 'static`.
pub trait Task<T>: Send + 'static {
    /// Starts the task under the given cancellation scope.
    fn run(self: Box<Self>, cancel: CancellationToken) -> BoxFuture<'static, Result<T, TaskError>>;
}

impl<T, F, Fut> Task<T> for F
where
    F: FnOnce(CancellationToken) -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, TaskError>> + Send + 'static,
{
    fn run(self: Box<Self>, cancel: CancellationToken) -> BoxFuture<'static, Result<T, TaskError>> {
        (*self)(cancel).boxed()
    }
}

/// A type-erased task, as accepted by batch operations.
pub type BoxTask<T> = Box<dyn Task<T>>;

/// Boxes an async closure into a [`BoxTask`].
pub fn task<T, F, Fut>(f: F) -> BoxTask<T>
where
    T: 'static,
    F: FnOnce(CancellationToken) -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, TaskError>> + Send + 'static,
{
    Box::new(f)
}

/// Wraps a synchronous, possibly blocking closure into a [`BoxTask`].
///
/// The closure runs on Tokio's blocking pool so it never stalls the async
/// workers. A panic inside it is caught on the blocking thread and reported
/// as [`ExecutorError::Panic`](super::ExecutorError::Panic). The closure
/// cannot be interrupted: if the caller stops waiting, it keeps running.
pub fn blocking<T, F>(f: F) -> BoxTask<T>
where
    T: Send + 'static,
    F: FnOnce(CancellationToken) -> Result<T, TaskError> + Send + 'static,
{
    task(move |cancel: CancellationToken| async move {
        match tokio::task::spawn_blocking(move || catch_sync(move || f(cancel))).await {
            Ok(Ok(result)) => result,
            Ok(Err(fault)) => Err(Box::new(fault) as TaskError),
            Err(join_error) => Err(Box::new(join_error) as TaskError),
        }
    })
}

/// Identifier assigned to every accepted submission, unique per executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u64);

impl TaskId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Numeric value of the identifier.
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task {}", self.0)
    }
}

/// The single result published for one accepted submission.
#[derive(Debug)]
pub struct Completion<T> {
    /// Identifier returned (or assigned) at submission.
    pub id: TaskId,
    /// Position of the task in the batch that submitted it; `0` for
    /// single submissions.
    pub index: usize,
    /// Value or error produced by the task.
    pub result: TaskResult<T>,
}

impl<T> Completion<T> {
    /// True if the task produced a value.
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    /// True if the task produced an error of any kind.
    pub fn is_err(&self) -> bool {
        self.result.is_err()
    }

    /// Discards the identity and returns the task outcome.
    pub fn into_result(self) -> TaskResult<T> {
        self.result
    }
}
