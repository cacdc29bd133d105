//! Single task raced against a deadline.

use super::core::Executor;
use super::error::{ExecutorError, TaskError, TaskResult};
use super::task::BoxTask;
use crate::log_warn;
use std::future::Future;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

impl<T: Send + 'static> Executor<T> {
    /// Runs one task and waits at most `timeout` for its result.
    ///
    /// The task goes through the same admission and panic guard as
    /// [`execute`](Self::execute), under a scope derived from the executor's
    /// scope. Its result is returned directly and is not published to the
    /// executor's sink.
    ///
    /// If `timeout` elapses first, [`ExecutorError::Timeout`] is returned and
    /// the derived scope is cancelled. A task still waiting for a slot is then
    /// never started; a running task is *not* stopped. It keeps its slot and
    /// any side effects it performs until it observes the cancellation token
    /// or finishes on its own, and its eventual result is discarded.
    pub async fn execute_with_timeout<F, Fut>(&self, task: F, timeout: Duration) -> TaskResult<T>
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, TaskError>> + Send + 'static,
    {
        self.execute_boxed_with_timeout(Box::new(task), timeout)
            .await
    }

    /// Boxed form of [`execute_with_timeout`](Self::execute_with_timeout).
    pub async fn execute_boxed_with_timeout(
        &self,
        task: BoxTask<T>,
        timeout: Duration,
    ) -> TaskResult<T> {
        let entry = self.inner.in_flight.enter().ok_or(ExecutorError::ShutDown)?;
        let id = self.next_id();

        let scope = self.inner.root.child_token();
        // Cancels the derived scope on every exit path, including the caller
        // dropping this future.
        let _scope_guard = scope.clone().drop_guard();

        let (tx, rx) = oneshot::channel();
        self.spawn_unit(id, task, scope, entry, move |result| {
            let _ = tx.send(result);
        });

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(result)) => result,
            // The unit always publishes before dropping the sender.
            Ok(Err(_)) => Err(ExecutorError::Cancelled),
            Err(_) => {
                log_warn!(
                    self.inner.logger,
                    "{} timed out after {:?}; it keeps running until it observes cancellation",
                    id,
                    timeout
                );
                Err(ExecutorError::Timeout(timeout))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::executor::{Executor, ExecutorError, ExecutorOptions};
    use crate::log::{MemoryLogger, NoOpLogger};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    fn quiet() -> ExecutorOptions {
        ExecutorOptions::default().with_logger(Arc::new(NoOpLogger))
    }

    #[tokio::test]
    async fn test_fast_task_returns_value() {
        let executor = Executor::new(1, quiet()).unwrap();
        let result = executor
            .execute_with_timeout(|_| async { Ok("quick") }, Duration::from_secs(1))
            .await;
        assert_eq!(result.unwrap(), "quick");
        assert!(executor.try_next_completion().is_none());
    }

    #[tokio::test]
    async fn test_slow_task_times_out() {
        let memory = Arc::new(MemoryLogger::new());
        let executor =
            Executor::new(1, ExecutorOptions::default().with_logger(memory.clone())).unwrap();

        let started = Instant::now();
        let result = executor
            .execute_with_timeout(
                |_| async {
                    tokio::time::sleep(Duration::from_millis(500)).await;
                    Ok(())
                },
                Duration::from_millis(50),
            )
            .await;

        assert!(matches!(result, Err(ExecutorError::Timeout(d)) if d == Duration::from_millis(50)));
        assert!(started.elapsed() < Duration::from_millis(400));
        assert!(memory.contains("timed out"));
    }

    #[tokio::test]
    async fn test_timeout_cancels_derived_scope() {
        let executor = Executor::new(1, quiet()).unwrap();
        let observed = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&observed);

        let result = executor
            .execute_with_timeout(
                move |cancel| async move {
                    cancel.cancelled().await;
                    flag.store(true, Ordering::SeqCst);
                    Ok(())
                },
                Duration::from_millis(20),
            )
            .await;
        assert!(result.unwrap_err().is_timeout());

        executor.wait_idle().await;
        assert!(observed.load(Ordering::SeqCst));
        assert!(!executor.cancellation_token().is_cancelled());
    }

    #[tokio::test]
    async fn test_timeout_while_queued_never_starts_task() {
        let executor = Executor::new(1, quiet()).unwrap();
        executor
            .execute(|_| async {
                tokio::time::sleep(Duration::from_millis(100)).await;
                Ok(())
            })
            .unwrap();

        let started = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&started);
        let result = executor
            .execute_with_timeout(
                move |_| async move {
                    flag.store(true, Ordering::SeqCst);
                    Ok(())
                },
                Duration::from_millis(20),
            )
            .await;

        assert!(result.unwrap_err().is_timeout());
        executor.wait_idle().await;
        assert!(!started.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_panic_is_returned_as_error() {
        let executor = Executor::<u8>::new(1, quiet()).unwrap();
        let result = executor
            .execute_with_timeout(
                |_| async {
                    if true {
                        panic!("boom");
                    }
                    Ok(1)
                },
                Duration::from_secs(1),
            )
            .await;
        let err = result.unwrap_err();
        assert!(err.is_panic());
        assert!(err.to_string().contains("boom"));
    }
}
