//! Batch submission.
//!
//! Each batch call owns a private result channel, so two batches running at
//! the same time, or a batch running next to single submissions, never see
//! each other's results. Results are returned in completion order; the
//! [`Completion::index`] field gives the position of the originating task in
//! the submitted sequence.

use super::core::Executor;
use super::error::ExecutorError;
use super::task::{BoxTask, Completion};
use crate::log_warn;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

impl<T: Send + 'static> Executor<T> {
    /// Runs every task and waits for all of them.
    ///
    /// Returns exactly one [`Completion`] per task, in completion order.
    /// Tasks submitted after [`shutdown`](Self::shutdown) yield an
    /// [`ExecutorError::ShutDown`] completion instead of running.
    pub async fn execute_all<I>(&self, tasks: I) -> Vec<Completion<T>>
    where
        I: IntoIterator<Item = BoxTask<T>>,
    {
        let scope = self.inner.root.child_token();
        let (submitted, mut rx) = self.submit_batch(tasks, &scope);

        let mut results = Vec::with_capacity(submitted);
        while let Some(completion) = rx.recv().await {
            results.push(completion);
        }
        results
    }

    /// Runs every task and collects the results that arrive within `timeout`.
    ///
    /// If all tasks finish in time this behaves like
    /// [`execute_all`](Self::execute_all). Otherwise the results collected so
    /// far are returned and nothing is appended afterwards: the returned
    /// vector can be shorter than the number of tasks. When the deadline
    /// passes, the batch's scope is cancelled, so tasks still waiting for a
    /// slot never start; tasks already running are not stopped and their
    /// results are discarded.
    pub async fn execute_all_with_timeout<I>(&self, timeout: Duration, tasks: I) -> Vec<Completion<T>>
    where
        I: IntoIterator<Item = BoxTask<T>>,
    {
        let scope = self.inner.root.child_token();
        let _scope_guard = scope.clone().drop_guard();
        let (submitted, mut rx) = self.submit_batch(tasks, &scope);

        let deadline = tokio::time::sleep(timeout);
        tokio::pin!(deadline);

        let mut results = Vec::with_capacity(submitted);
        loop {
            tokio::select! {
                completion = rx.recv() => match completion {
                    Some(completion) => results.push(completion),
                    None => break,
                },
                _ = &mut deadline => {
                    log_warn!(
                        self.inner.logger,
                        "batch timed out after {:?}: returning {} of {} results",
                        timeout,
                        results.len(),
                        submitted
                    );
                    break;
                }
            }
        }
        results
    }

    /// Submits every task of a batch under `scope`.
    ///
    /// Returns the number of tasks and the receiver their completions are
    /// published to. The receiver yields `None` once every task has
    /// published.
    fn submit_batch<I>(
        &self,
        tasks: I,
        scope: &CancellationToken,
    ) -> (usize, mpsc::UnboundedReceiver<Completion<T>>)
    where
        I: IntoIterator<Item = BoxTask<T>>,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut submitted = 0;

        for (index, task) in tasks.into_iter().enumerate() {
            submitted += 1;
            let id = self.next_id();
            let Some(entry) = self.inner.in_flight.enter() else {
                let _ = tx.send(Completion {
                    id,
                    index,
                    result: Err(ExecutorError::ShutDown),
                });
                continue;
            };

            let sink = tx.clone();
            self.spawn_unit(id, task, scope.clone(), entry, move |result| {
                // The batch may have stopped listening after a timeout.
                let _ = sink.send(Completion { id, index, result });
            });
        }

        (submitted, rx)
    }
}

#[cfg(test)]
mod tests {
    use crate::executor::{task, BoxTask, Executor, ExecutorOptions};
    use crate::log::{MemoryLogger, NoOpLogger};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn quiet() -> ExecutorOptions {
        ExecutorOptions::default().with_logger(Arc::new(NoOpLogger))
    }

    fn sleeper(index: usize, millis: u64) -> BoxTask<usize> {
        task(move |_| async move {
            tokio::time::sleep(Duration::from_millis(millis)).await;
            Ok(index)
        })
    }

    #[tokio::test]
    async fn test_execute_all_returns_one_result_per_task() {
        let executor = Executor::new(3, quiet()).unwrap();
        let tasks: Vec<_> = (0..6).map(|i| sleeper(i, 5)).collect();

        let results = executor.execute_all(tasks).await;
        assert_eq!(results.len(), 6);

        let mut indices: Vec<_> = results.iter().map(|c| c.index).collect();
        indices.sort_unstable();
        assert_eq!(indices, vec![0, 1, 2, 3, 4, 5]);
        for completion in results {
            let index = completion.index;
            assert_eq!(completion.into_result().unwrap(), index);
        }
    }

    #[tokio::test]
    async fn test_execute_all_empty() {
        let executor = Executor::<()>::new(1, quiet()).unwrap();
        let results = executor.execute_all(Vec::new()).await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_results_arrive_in_completion_order() {
        let executor = Executor::new(2, quiet()).unwrap();
        let results = executor
            .execute_all(vec![sleeper(0, 80), sleeper(1, 5)])
            .await;
        assert_eq!(results[0].index, 1);
        assert_eq!(results[1].index, 0);
    }

    #[tokio::test]
    async fn test_batch_does_not_consume_sink() {
        let executor = Executor::new(2, quiet()).unwrap();
        let single = executor.execute(|_| async { Ok(99) }).unwrap();

        let results = executor.execute_all(vec![sleeper(0, 1)]).await;
        assert_eq!(results.len(), 1);

        let completion = executor.next_completion().await.unwrap();
        assert_eq!(completion.id, single);
    }

    #[tokio::test]
    async fn test_batch_timeout_returns_partial_results() {
        let memory = Arc::new(MemoryLogger::new());
        let executor =
            Executor::new(4, ExecutorOptions::default().with_logger(memory.clone())).unwrap();

        let results = executor
            .execute_all_with_timeout(
                Duration::from_millis(100),
                vec![sleeper(0, 5), sleeper(1, 5), sleeper(2, 1_000)],
            )
            .await;

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|c| c.index != 2));
        assert!(memory.contains("returning 2 of 3 results"));
    }

    #[tokio::test]
    async fn test_cancelled_batch_scope_completes_queued_task_as_cancelled() {
        let executor = Executor::new(1, quiet()).unwrap();
        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);

        let scope = executor.cancellation_token().child_token();
        let (submitted, mut rx) = executor.submit_batch(
            vec![
                sleeper(0, 100),
                task(move |_| async move {
                    flag.store(true, Ordering::SeqCst);
                    Ok(1)
                }),
            ],
            &scope,
        );
        assert_eq!(submitted, 2);

        tokio::time::sleep(Duration::from_millis(20)).await;
        scope.cancel();

        let mut completions = Vec::new();
        while let Some(completion) = rx.recv().await {
            completions.push(completion);
        }
        assert_eq!(completions.len(), 2);

        let queued = completions.iter().find(|c| c.index == 1).unwrap();
        assert!(matches!(
            queued.result,
            Err(crate::executor::ExecutorError::Cancelled)
        ));
        let long = completions.iter().find(|c| c.index == 0).unwrap();
        assert!(long.is_ok());
        assert!(!ran.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_batch_timeout_with_everything_done_in_time() {
        let executor = Executor::new(2, quiet()).unwrap();
        let results = executor
            .execute_all_with_timeout(Duration::from_secs(1), vec![sleeper(0, 1), sleeper(1, 1)])
            .await;
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn test_batch_after_shutdown_yields_shutdown_errors() {
        let executor = Executor::new(1, quiet()).unwrap();
        executor.shutdown(Duration::from_millis(50)).await.unwrap();

        let results = executor
            .execute_all(vec![sleeper(0, 1), sleeper(1, 1)])
            .await;
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|c| matches!(
            c.result,
            Err(crate::executor::ExecutorError::ShutDown)
        )));
    }
}
