//! Executor error types.

use crate::panic::PanicFault;
use std::time::Duration;
use thiserror::Error;

/// Error reported by a task body.
pub type TaskError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Outcome of one task execution.
pub type TaskResult<T> = Result<T, ExecutorError>;

/// Errors surfaced by executor operations.
///
/// Single-task operations return these inside a [`TaskResult`]; only
/// [`Executor::shutdown`](super::Executor::shutdown) returns one directly.
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// The task body returned an error.
    #[error("task failed: {0}")]
    Task(#[source] TaskError),

    /// The task body panicked; the panic was recovered.
    #[error("{0}")]
    Panic(PanicFault),

    /// The cancellation scope fired before the task acquired a slot.
    #[error("task cancelled before it was started")]
    Cancelled,

    /// The caller stopped waiting for the task.
    #[error("task timed out after {0:?}")]
    Timeout(Duration),

    /// In-flight tasks did not drain before the shutdown deadline.
    #[error("shutdown timed out after {timeout:?} with {remaining} task(s) still in flight")]
    ShutdownTimeout {
        /// Deadline that elapsed.
        timeout: Duration,
        /// In-flight submissions when the deadline elapsed.
        remaining: usize,
    },

    /// The submission was rejected because the executor was shut down.
    #[error("executor has been shut down")]
    ShutDown,
}

impl ExecutorError {
    /// True for [`ExecutorError::Timeout`] and [`ExecutorError::ShutdownTimeout`].
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::ShutdownTimeout { .. })
    }

    /// True if the task never started because its scope was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// True if the task body panicked.
    pub fn is_panic(&self) -> bool {
        matches!(self, Self::Panic(_))
    }

    /// Returns the recovered panic, if this error is one.
    pub fn panic_fault(&self) -> Option<&PanicFault> {
        match self {
            Self::Panic(fault) => Some(fault),
            _ => None,
        }
    }
}

/// Errors raised while constructing an executor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// Capacity must be at least one.
    #[error("invalid executor capacity {0}: must be greater than zero")]
    InvalidCapacity(usize),

    /// The executor was built outside a Tokio runtime.
    #[error("executor must be created from within a Tokio runtime")]
    NoRuntime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_error_display_and_source() {
        let err = ExecutorError::Task("connection reset".into());
        assert_eq!(err.to_string(), "task failed: connection reset");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_timeout_display() {
        let err = ExecutorError::Timeout(Duration::from_millis(1500));
        assert!(err.to_string().contains("1.5s"));
        assert!(err.is_timeout());
        assert!(!err.is_cancelled());
    }

    #[test]
    fn test_shutdown_timeout_display() {
        let err = ExecutorError::ShutdownTimeout {
            timeout: Duration::from_secs(5),
            remaining: 3,
        };
        let text = err.to_string();
        assert!(text.contains("5s"));
        assert!(text.contains("3 task(s)"));
        assert!(err.is_timeout());
    }

    #[test]
    fn test_predicates() {
        assert!(ExecutorError::Cancelled.is_cancelled());
        assert!(!ExecutorError::ShutDown.is_timeout());
        assert!(ExecutorError::Cancelled.panic_fault().is_none());
    }

    #[test]
    fn test_build_error_display() {
        assert!(BuildError::InvalidCapacity(0).to_string().contains("capacity 0"));
        assert!(BuildError::NoRuntime.to_string().contains("Tokio runtime"));
    }
}
