//! Cancellation, idle waiting and shutdown.

use super::core::Executor;
use super::error::ExecutorError;
use crate::{log_info, log_warn};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

impl<T> Executor<T> {
    /// Returns a clone of the executor's root cancellation scope.
    ///
    /// Every task receives this token (or a child of it). Cancelling it has
    /// the same effect as [`cancel`](Self::cancel).
    pub fn cancellation_token(&self) -> CancellationToken {
        self.inner.root.clone()
    }

    /// Cancels the root scope without waiting.
    ///
    /// Submissions still waiting for a slot complete with
    /// [`ExecutorError::Cancelled`] and never run; running tasks are only
    /// signalled. Cancellation is permanent: later submissions are accepted
    /// but complete as cancelled.
    pub fn cancel(&self) {
        self.inner.root.cancel();
    }

    /// True once the root scope has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.inner.root.is_cancelled()
    }

    /// True once [`shutdown`](Self::shutdown) has been called.
    pub fn is_shut_down(&self) -> bool {
        self.inner.in_flight.is_closed()
    }

    /// Waits until no submission is in flight, without cancelling anything.
    pub async fn wait_idle(&self) {
        self.inner.in_flight.wait_idle().await;
    }

    /// Stops the executor.
    ///
    /// Rejects further submissions, cancels the root scope and waits up to
    /// `timeout` for in-flight submissions to publish their results. Returns
    /// as soon as they have, which is immediately when nothing is in flight.
    ///
    /// # Errors
    ///
    /// [`ExecutorError::ShutdownTimeout`] if work is still in flight when
    /// `timeout` elapses. That work is left running; it is not terminated.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), ExecutorError> {
        self.inner.in_flight.close();
        self.inner.root.cancel();

        let pending = self.inner.in_flight.count();
        log_info!(
            self.inner.logger,
            "executor shutting down with {} task(s) in flight",
            pending
        );

        match tokio::time::timeout(timeout, self.inner.in_flight.wait_idle()).await {
            Ok(()) => {
                log_info!(self.inner.logger, "executor shut down");
                Ok(())
            }
            Err(_) => {
                let remaining = self.inner.in_flight.count();
                log_warn!(
                    self.inner.logger,
                    "shutdown timed out after {:?}; {} task(s) still in flight",
                    timeout,
                    remaining
                );
                Err(ExecutorError::ShutdownTimeout { timeout, remaining })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::executor::{Executor, ExecutorError, ExecutorOptions};
    use crate::log::{MemoryLogger, NoOpLogger};
    use std::sync::Arc;
    use std::time::{Duration, Instant};
    use tokio_util::sync::CancellationToken;

    fn quiet() -> ExecutorOptions {
        ExecutorOptions::default().with_logger(Arc::new(NoOpLogger))
    }

    #[tokio::test]
    async fn test_shutdown_idle_executor_is_prompt() {
        let executor = Executor::<()>::new(2, quiet()).unwrap();
        let started = Instant::now();
        executor.shutdown(Duration::from_secs(5)).await.unwrap();
        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(executor.is_shut_down());
        assert!(executor.is_cancelled());
    }

    #[tokio::test]
    async fn test_shutdown_rejects_new_submissions() {
        let executor = Executor::new(1, quiet()).unwrap();
        executor.shutdown(Duration::from_millis(10)).await.unwrap();

        let err = executor.execute(|_| async { Ok(()) }).unwrap_err();
        assert!(matches!(err, ExecutorError::ShutDown));

        let err = executor
            .execute_with_timeout(|_| async { Ok(()) }, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutorError::ShutDown));
    }

    #[tokio::test]
    async fn test_shutdown_signals_cooperative_tasks() {
        let executor = Executor::new(2, quiet()).unwrap();
        executor
            .execute(|cancel| async move {
                cancel.cancelled().await;
                Ok("stopped")
            })
            .unwrap();
        // Let the task reach its body before the scope is cancelled.
        tokio::time::sleep(Duration::from_millis(20)).await;

        executor.shutdown(Duration::from_secs(1)).await.unwrap();
        let completion = executor.next_completion().await.unwrap();
        assert_eq!(completion.into_result().unwrap(), "stopped");
    }

    #[tokio::test]
    async fn test_shutdown_times_out_on_stubborn_task() {
        let memory = Arc::new(MemoryLogger::new());
        let executor =
            Executor::new(1, ExecutorOptions::default().with_logger(memory.clone())).unwrap();
        executor
            .execute(|_| async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok(())
            })
            .unwrap();

        let err = executor
            .shutdown(Duration::from_millis(50))
            .await
            .unwrap_err();
        match err {
            ExecutorError::ShutdownTimeout { timeout, remaining } => {
                assert_eq!(timeout, Duration::from_millis(50));
                assert_eq!(remaining, 1);
            }
            other => panic!("expected shutdown timeout, got {:?}", other),
        }
        assert!(memory.contains("shutdown timed out"));
        assert!(executor.is_shut_down());
    }

    #[tokio::test]
    async fn test_cancel_is_monotonic_but_keeps_accepting() {
        let executor = Executor::new(1, quiet()).unwrap();
        executor.cancel();
        executor.cancel();
        assert!(executor.is_cancelled());
        assert!(!executor.is_shut_down());

        executor.execute(|_| async { Ok(1) }).unwrap();
        let completion = executor.next_completion().await.unwrap();
        assert!(completion.result.unwrap_err().is_cancelled());
    }

    #[tokio::test]
    async fn test_parent_scope_cancels_executor_not_vice_versa() {
        let parent = CancellationToken::new();
        let executor = Executor::<()>::new(1, quiet().with_parent(parent.clone())).unwrap();

        executor.cancel();
        assert!(!parent.is_cancelled());

        let second = Executor::<()>::new(1, quiet().with_parent(parent.clone())).unwrap();
        parent.cancel();
        assert!(second.is_cancelled());
    }

    #[tokio::test]
    async fn test_wait_idle_does_not_cancel() {
        let executor = Executor::new(2, quiet()).unwrap();
        executor
            .execute(|_| async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok(())
            })
            .unwrap();
        executor.wait_idle().await;
        assert_eq!(executor.in_flight(), 0);
        assert!(!executor.is_cancelled());
        assert!(executor.next_completion().await.unwrap().is_ok());
    }
}
