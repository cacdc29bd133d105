//! Executor configuration.
//!
//! This module contains [`ExecutorOptions`], the optional collaborators an
//! executor can be built with, and the defaults shared with the config file.

use crate::log::{Logger, TracingLogger};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

// =============================================================================
// Configuration Constants
// =============================================================================

/// Fallback CPU count when detection fails.
pub const FALLBACK_CPU_COUNT: usize = 4;

/// Default time allowed for in-flight tasks to drain on shutdown.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Default executor capacity: one slot per available CPU.
pub fn default_capacity() -> usize {
    std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(FALLBACK_CPU_COUNT)
}

// =============================================================================
// Executor Options
// =============================================================================

/// Optional settings for [`Executor::new`](super::Executor::new).
///
/// ```ignore
/// let parent = CancellationToken::new();
/// let options = ExecutorOptions::default()
///     .with_logger(Arc::new(TracingLogger::with_component("import")))
///     .with_parent(parent.clone());
/// let executor = Executor::<String>::new(4, options)?;
/// ```
#[derive(Clone)]
pub struct ExecutorOptions {
    /// Sink for diagnostic lines.
    pub logger: Arc<dyn Logger>,

    /// Outer cancellation scope. Cancelling it cancels the executor;
    /// cancelling the executor never cancels it.
    pub parent: Option<CancellationToken>,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        Self {
            logger: Arc::new(TracingLogger::new()),
            parent: None,
        }
    }
}

impl ExecutorOptions {
    /// Replaces the logger.
    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    /// Derives the executor's scope from `parent`.
    pub fn with_parent(mut self, parent: CancellationToken) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Builds the executor's root scope.
    pub(crate) fn root_scope(&self) -> CancellationToken {
        match &self.parent {
            Some(parent) => parent.child_token(),
            None => CancellationToken::new(),
        }
    }
}

impl fmt::Debug for ExecutorOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutorOptions")
            .field("parent", &self.parent.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::NoOpLogger;

    #[test]
    fn test_default_capacity_is_positive() {
        assert!(default_capacity() >= 1);
    }

    #[test]
    fn test_root_scope_without_parent_is_fresh() {
        let options = ExecutorOptions::default();
        let root = options.root_scope();
        assert!(!root.is_cancelled());
    }

    #[test]
    fn test_root_scope_is_child_of_parent() {
        let parent = CancellationToken::new();
        let options = ExecutorOptions::default()
            .with_logger(Arc::new(NoOpLogger))
            .with_parent(parent.clone());

        let root = options.root_scope();
        root.cancel();
        assert!(!parent.is_cancelled(), "child must not cancel parent");

        let root = options.root_scope();
        parent.cancel();
        assert!(root.is_cancelled(), "parent must cancel child");
    }

    #[test]
    fn test_debug_hides_logger() {
        let debug = format!("{:?}", ExecutorOptions::default());
        assert!(debug.contains("parent: false"));
    }
}
