//! Sluice - bounded-concurrency task execution on Tokio
//!
//! This library runs fallible, cancellable tasks with a fixed upper bound on
//! how many execute at once, converts task panics into ordinary errors, and
//! offers timeout-bounded waits for single tasks and batches.
//!
//! # High-Level API
//!
//! ```ignore
//! use sluice::executor::{task, Executor, ExecutorOptions};
//! use std::time::Duration;
//!
//! let executor = Executor::new(2, ExecutorOptions::default())?;
//! let results = executor
//!     .execute_all((0..5).map(|i| task(move |_| async move { Ok(i * 2) })))
//!     .await;
//! assert_eq!(results.len(), 5);
//!
//! executor.shutdown(Duration::from_secs(5)).await?;
//! ```
//!
//! Settings can also come from `~/.sluice/config.ini`; see [`config`].

pub mod config;
pub mod executor;
pub mod log;
pub mod logging;
pub mod panic;

pub use executor::{
    blocking, task, BoxTask, Completion, Executor, ExecutorError, ExecutorOptions, Task,
    TaskError, TaskId, TaskResult,
};

/// Version of the Sluice library and CLI.
///
/// Synchronized across the workspace and injected from `Cargo.toml`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
