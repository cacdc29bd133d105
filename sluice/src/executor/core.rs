//! Executor core - construction, submission and the per-task unit of execution.
//!
//! Timeout, batch and shutdown operations are implemented in separate modules:
//! - `timeout`: single task raced against a deadline
//! - `batch`: many tasks collected into one result set
//! - `lifecycle`: idle waiting, cancellation and shutdown

use super::config::ExecutorOptions;
use super::error::{BuildError, ExecutorError, TaskResult};
use super::in_flight::{InFlight, InFlightEntry};
use super::limiter::CapacityLimiter;
use super::task::{BoxTask, Completion, TaskId};
use crate::config::ExecutorSettings;
use crate::log::Logger;
use crate::panic::PanicGuard;
use crate::{log_debug, log_warn};
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

// =============================================================================
// Executor
// =============================================================================

/// Bounded-concurrency task executor.
///
/// Accepts fallible, cancellable tasks and runs at most `capacity` task bodies
/// at once. Each submission gets its own spawned unit of execution that waits
/// for a slot, runs the task under a [`PanicGuard`] and publishes exactly one
/// [`Completion`].
///
/// The handle is cheap to clone; all clones drive the same executor. When
/// the last clone is dropped the executor's cancellation scope is cancelled.
pub struct Executor<T> {
    pub(crate) inner: Arc<Inner<T>>,
}

pub(crate) struct Inner<T> {
    /// Admission gate bounding concurrently running task bodies.
    pub(crate) limiter: Arc<CapacityLimiter>,

    /// Root cancellation scope, a child of the configured parent.
    pub(crate) root: CancellationToken,

    /// Accepted submissions whose result is not yet published.
    pub(crate) in_flight: Arc<InFlight>,

    /// Sender half of the executor-wide result sink.
    pub(crate) sink_tx: mpsc::UnboundedSender<Completion<T>>,

    /// Receiver half of the result sink; one drainer at a time.
    pub(crate) sink_rx: Mutex<mpsc::UnboundedReceiver<Completion<T>>>,

    pub(crate) guard: PanicGuard,
    pub(crate) logger: Arc<dyn Logger>,
    pub(crate) runtime: Handle,
    next_id: AtomicU64,
}

impl<T> Drop for Inner<T> {
    fn drop(&mut self) {
        self.root.cancel();
    }
}

impl<T> Clone for Executor<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Send + 'static> Executor<T> {
    /// Creates an executor running at most `capacity` tasks at once.
    ///
    /// Must be called from within a Tokio runtime; the runtime is captured so
    /// that later submissions may come from any thread.
    ///
    /// # Errors
    ///
    /// [`BuildError::InvalidCapacity`] if `capacity` is zero,
    /// [`BuildError::NoRuntime`] outside a Tokio runtime.
    pub fn new(capacity: usize, options: ExecutorOptions) -> Result<Self, BuildError> {
        if capacity == 0 {
            return Err(BuildError::InvalidCapacity(capacity));
        }
        let runtime = Handle::try_current().map_err(|_| BuildError::NoRuntime)?;

        let root = options.root_scope();
        let (sink_tx, sink_rx) = mpsc::unbounded_channel();
        let logger = options.logger;

        log_debug!(logger, "executor created with capacity {}", capacity);

        Ok(Self {
            inner: Arc::new(Inner {
                limiter: Arc::new(CapacityLimiter::new(capacity)),
                root,
                in_flight: Arc::new(InFlight::new()),
                sink_tx,
                sink_rx: Mutex::new(sink_rx),
                guard: PanicGuard::new(Arc::clone(&logger)),
                logger,
                runtime,
                next_id: AtomicU64::new(1),
            }),
        })
    }

    /// Creates an executor from the `[executor]` section of a config file.
    ///
    /// Only `capacity` is consumed here; `shutdown_timeout` and
    /// `task_timeout` are passed by the caller to the calls that take them.
    pub fn from_settings(
        settings: &ExecutorSettings,
        options: ExecutorOptions,
    ) -> Result<Self, BuildError> {
        Self::new(settings.capacity, options)
    }

    /// Submits a task and returns immediately.
    ///
    /// The task's [`Completion`] is published to the executor's result sink;
    /// read it with [`next_completion`](Self::next_completion). The sink is
    /// unbounded, so callers that never drain it accumulate results.
    ///
    /// # Errors
    ///
    /// [`ExecutorError::ShutDown`] if [`shutdown`](Self::shutdown) has been
    /// called. Nothing is published in that case.
    pub fn execute<F, Fut>(&self, task: F) -> Result<TaskId, ExecutorError>
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, super::TaskError>> + Send + 'static,
    {
        self.execute_boxed(Box::new(task))
    }

    /// Submits an already boxed task. See [`execute`](Self::execute).
    pub fn execute_boxed(&self, task: BoxTask<T>) -> Result<TaskId, ExecutorError> {
        let entry = self.inner.in_flight.enter().ok_or(ExecutorError::ShutDown)?;
        let id = self.next_id();
        let sink = self.inner.sink_tx.clone();

        self.spawn_unit(id, task, self.inner.root.clone(), entry, move |result| {
            // The receiver lives as long as the executor.
            let _ = sink.send(Completion {
                id,
                index: 0,
                result,
            });
        });
        Ok(id)
    }

    /// Spawns the unit of execution for one accepted submission.
    ///
    /// The unit waits for a slot unless `scope` is cancelled first, runs the
    /// task under the panic guard, hands the result to `publish` and only
    /// then leaves the in-flight count.
    pub(crate) fn spawn_unit<P>(
        &self,
        id: TaskId,
        task: BoxTask<T>,
        scope: CancellationToken,
        entry: InFlightEntry,
        publish: P,
    ) where
        P: FnOnce(TaskResult<T>) + Send + 'static,
    {
        let limiter = Arc::clone(&self.inner.limiter);
        let guard = self.inner.guard.clone();
        let logger = Arc::clone(&self.inner.logger);

        self.inner.runtime.spawn(async move {
            let result = tokio::select! {
                biased;

                _ = scope.cancelled() => {
                    log_warn!(logger, "{} cancelled while waiting for a slot", id);
                    Err(ExecutorError::Cancelled)
                }

                permit = limiter.acquire() => match permit {
                    Ok(_permit) => {
                        let token = scope.clone();
                        guard.run(id, async move { task.run(token).await }).await
                    }
                    Err(_) => Err(ExecutorError::Cancelled),
                },
            };

            publish(result);
            drop(entry);
        });
    }

    pub(crate) fn next_id(&self) -> TaskId {
        TaskId::new(self.inner.next_id.fetch_add(1, Ordering::Relaxed))
    }

    // -------------------------------------------------------------------------
    // Result sink
    // -------------------------------------------------------------------------

    /// Waits for the next result published by [`execute`](Self::execute).
    ///
    /// Completions arrive in completion order. Returns `None` only if the
    /// sink is closed, which cannot happen while this handle exists, so in
    /// practice it waits until a result is available.
    ///
    /// The sink has a single drainer. While a call is parked here it holds
    /// the receiver: other `next_completion` calls queue behind it, and
    /// [`try_next_completion`](Self::try_next_completion) and
    /// [`drain_completions`](Self::drain_completions) see nothing.
    pub async fn next_completion(&self) -> Option<Completion<T>> {
        self.inner.sink_rx.lock().await.recv().await
    }

    /// Returns the next published result if one is already available.
    ///
    /// Returns `None` while another caller is parked in
    /// [`next_completion`](Self::next_completion).
    pub fn try_next_completion(&self) -> Option<Completion<T>> {
        self.inner.sink_rx.try_lock().ok()?.try_recv().ok()
    }

    /// Takes every result currently buffered in the sink without waiting.
    ///
    /// Returns an empty vector while another caller is parked in
    /// [`next_completion`](Self::next_completion); that caller receives the
    /// next result instead.
    pub fn drain_completions(&self) -> Vec<Completion<T>> {
        let Ok(mut rx) = self.inner.sink_rx.try_lock() else {
            return Vec::new();
        };
        let mut drained = Vec::new();
        while let Ok(completion) = rx.try_recv() {
            drained.push(completion);
        }
        drained
    }
}

impl<T> Executor<T> {
    /// Maximum number of task bodies running at once.
    pub fn capacity(&self) -> usize {
        self.inner.limiter.capacity()
    }

    /// Accepted submissions whose result has not been published yet,
    /// including those still waiting for a slot.
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.count()
    }

    /// Point-in-time view of the executor's load.
    pub fn stats(&self) -> ExecutorStats {
        let running = self.inner.limiter.running();
        ExecutorStats {
            capacity: self.inner.limiter.capacity(),
            available: self.inner.limiter.available(),
            running,
            queued: self.inner.in_flight.count().saturating_sub(running),
            peak_running: self.inner.limiter.peak_running(),
        }
    }
}

impl<T> fmt::Debug for Executor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executor")
            .field("capacity", &self.inner.limiter.capacity())
            .field("in_flight", &self.inner.in_flight.count())
            .field("cancelled", &self.inner.root.is_cancelled())
            .field("shut_down", &self.inner.in_flight.is_closed())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Stats
// =============================================================================

/// Snapshot of executor load returned by [`Executor::stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutorStats {
    /// Configured capacity.
    pub capacity: usize,
    /// Free slots.
    pub available: usize,
    /// Task bodies currently running.
    pub running: usize,
    /// Accepted submissions still waiting for a slot or publishing.
    pub queued: usize,
    /// Highest number of concurrently running bodies observed.
    pub peak_running: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::{LogLevel, MemoryLogger, NoOpLogger};
    use std::time::Duration;

    fn quiet() -> ExecutorOptions {
        ExecutorOptions::default().with_logger(Arc::new(NoOpLogger))
    }

    #[tokio::test]
    async fn test_zero_capacity_is_rejected() {
        let err = Executor::<()>::new(0, quiet()).unwrap_err();
        assert_eq!(err, BuildError::InvalidCapacity(0));
    }

    #[test]
    fn test_requires_runtime() {
        let err = Executor::<()>::new(1, quiet()).unwrap_err();
        assert_eq!(err, BuildError::NoRuntime);
    }

    #[tokio::test]
    async fn test_from_settings_uses_capacity() {
        let settings = ExecutorSettings {
            capacity: 3,
            ..ExecutorSettings::default()
        };
        let executor = Executor::<()>::from_settings(&settings, quiet()).unwrap();
        assert_eq!(executor.capacity(), 3);
    }

    #[tokio::test]
    async fn test_execute_publishes_completion() {
        let executor = Executor::new(2, quiet()).unwrap();
        let id = executor.execute(|_| async { Ok(7) }).unwrap();

        let completion = executor.next_completion().await.unwrap();
        assert_eq!(completion.id, id);
        assert_eq!(completion.index, 0);
        assert_eq!(completion.into_result().unwrap(), 7);
    }

    #[tokio::test]
    async fn test_ids_are_unique() {
        let executor = Executor::new(1, quiet()).unwrap();
        let a = executor.execute(|_| async { Ok(()) }).unwrap();
        let b = executor.execute(|_| async { Ok(()) }).unwrap();
        assert_ne!(a, b);
        assert!(b > a);
    }

    #[tokio::test]
    async fn test_execute_from_plain_thread() {
        let executor = Executor::new(1, quiet()).unwrap();
        let remote = executor.clone();
        std::thread::spawn(move || remote.execute(|_| async { Ok("from thread") }))
            .join()
            .unwrap()
            .unwrap();

        let completion = executor.next_completion().await.unwrap();
        assert_eq!(completion.into_result().unwrap(), "from thread");
    }

    #[tokio::test]
    async fn test_cancelled_scope_skips_body_and_logs() {
        let memory = Arc::new(MemoryLogger::new());
        let executor = Executor::new(1, ExecutorOptions::default().with_logger(memory.clone()))
            .unwrap();
        executor.cancel();

        let ran = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let flag = Arc::clone(&ran);
        executor
            .execute(move |_| async move {
                flag.store(true, Ordering::SeqCst);
                Ok(())
            })
            .unwrap();

        let completion = executor.next_completion().await.unwrap();
        assert!(completion.result.unwrap_err().is_cancelled());
        assert!(!ran.load(Ordering::SeqCst));
        assert!(!memory.messages_at(LogLevel::Warn).is_empty());
    }

    #[tokio::test]
    async fn test_try_next_and_drain() {
        let executor = Executor::new(4, quiet()).unwrap();
        assert!(executor.try_next_completion().is_none());

        for i in 0..3 {
            executor.execute(move |_| async move { Ok(i) }).unwrap();
        }
        executor.wait_idle().await;

        let first = executor.try_next_completion();
        assert!(first.is_some());
        let rest = executor.drain_completions();
        assert_eq!(rest.len(), 2);
        assert!(executor.try_next_completion().is_none());
    }

    #[tokio::test]
    async fn test_drain_does_not_block_behind_parked_reader() {
        let executor = Executor::<u32>::new(1, quiet()).unwrap();
        let reader = executor.clone();
        let parked = tokio::spawn(async move { reader.next_completion().await });
        tokio::task::yield_now().await;

        let drained = tokio::time::timeout(Duration::from_millis(100), async {
            executor.drain_completions()
        })
        .await
        .expect("drain must return immediately");
        assert!(drained.is_empty());
        assert!(executor.try_next_completion().is_none());

        executor.execute(|_| async { Ok(9) }).unwrap();
        let completion = parked.await.unwrap().unwrap();
        assert_eq!(completion.into_result().unwrap(), 9);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_stats_track_running_and_queued() {
        let executor = Executor::new(1, quiet()).unwrap();
        for _ in 0..3 {
            executor
                .execute(|_| async {
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    Ok(())
                })
                .unwrap();
        }
        tokio::time::sleep(Duration::from_millis(30)).await;

        let stats = executor.stats();
        assert_eq!(stats.capacity, 1);
        assert_eq!(stats.running, 1);
        assert_eq!(stats.available, 0);
        assert_eq!(stats.queued, 2);

        executor.wait_idle().await;
        let stats = executor.stats();
        assert_eq!(stats.running, 0);
        assert_eq!(stats.peak_running, 1);
    }

    #[tokio::test]
    async fn test_dropping_last_handle_cancels_scope() {
        let executor = Executor::<()>::new(1, quiet()).unwrap();
        let token = executor.cancellation_token();
        drop(executor);
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn test_debug_format() {
        let executor = Executor::<()>::new(3, quiet()).unwrap();
        let debug = format!("{:?}", executor);
        assert!(debug.contains("capacity: 3"));
    }
}
