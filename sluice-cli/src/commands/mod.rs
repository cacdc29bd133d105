//! CLI command implementations.
//!
//! - [`config`] - Configuration management (path, show, init)
//! - [`run`] - Synthetic workload through the executor

pub mod config;
pub mod run;
