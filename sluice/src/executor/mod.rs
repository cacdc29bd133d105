//! Bounded-concurrency task executor.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Executor                            │
//! │  execute · execute_with_timeout · execute_all · shutdown    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  one spawned unit per submission:                           │
//! │    wait for slot ──(scope cancelled)──▶ Cancelled           │
//! │        │                                                    │
//! │        ▼                                                    │
//! │    PanicGuard::run(task) ──▶ publish Completion ──▶ leave   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────┐   │
//! │  │ Capacity     │  │ In-flight    │  │ Result sink      │   │
//! │  │ limiter      │  │ counter      │  │ (or batch chan)  │   │
//! │  └──────────────┘  └──────────────┘  └──────────────────┘   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Guarantees
//!
//! - At most `capacity` task bodies run at any instant.
//! - Every accepted submission produces exactly one [`Completion`]: a value,
//!   a task error, a recovered panic, or a cancellation.
//! - A panicking task never takes down the executor or other tasks.
//! - Cancellation is cooperative. Tasks receive a [`CancellationToken`];
//!   timeouts and shutdown cancel it but never preempt a running body.
//!
//! # Example
//!
//! ```ignore
//! use sluice::executor::{task, Executor, ExecutorOptions};
//! use std::time::Duration;
//!
//! let executor = Executor::new(4, ExecutorOptions::default())?;
//!
//! executor.execute(|_| async { Ok("fire and forget") })?;
//! let first = executor.next_completion().await;
//!
//! let value = executor
//!     .execute_with_timeout(|_| async { Ok("bounded") }, Duration::from_secs(1))
//!     .await?;
//!
//! let results = executor
//!     .execute_all((0..10).map(|i| task(move |_| async move { Ok(i) })))
//!     .await;
//!
//! executor.shutdown(Duration::from_secs(5)).await?;
//! ```
//!
//! [`CancellationToken`]: tokio_util::sync::CancellationToken

mod batch;
mod config;
mod core;
mod error;
mod in_flight;
mod lifecycle;
mod limiter;
mod task;
mod timeout;

pub use config::{default_capacity, ExecutorOptions, DEFAULT_SHUTDOWN_TIMEOUT, FALLBACK_CPU_COUNT};
pub use core::{Executor, ExecutorStats};
pub use error::{BuildError, ExecutorError, TaskError, TaskResult};
pub use task::{blocking, task, BoxTask, Completion, Task, TaskId};
