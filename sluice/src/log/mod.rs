//! Logging capability injected into the executor.
//!
//! The executor never talks to a global logger. It is handed an
//! `Arc<dyn Logger>` at construction and routes every diagnostic line through
//! it: admissions abandoned by cancellation, recovered panics, timeouts,
//! partial batch results and shutdown progress.
//!
//! # Adapters
//!
//! - [`TracingLogger`]: forwards to the `tracing` crate (the default)
//! - [`NoOpLogger`]: discards everything
//! - [`MemoryLogger`]: keeps lines in memory for later inspection
//!
//! ```
//! use sluice::log::{Logger, MemoryLogger};
//! use sluice::log_warn;
//! use std::sync::Arc;
//!
//! let memory = Arc::new(MemoryLogger::new());
//! let logger: Arc<dyn Logger> = memory.clone();
//! log_warn!(logger, "slot wait abandoned for task {}", 7);
//! assert!(memory.contains("task 7"));
//! ```

mod sinks;
mod tracing_adapter;
mod r#trait;

pub use r#trait::{LogLevel, Logger, ParseLogLevelError};
pub use sinks::{MemoryLogger, NoOpLogger};
pub use tracing_adapter::TracingLogger;
