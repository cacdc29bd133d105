//! Settings structs for each configuration section.
//!
//! Each struct represents one `[section]` of the INI config file.

use crate::executor::{default_capacity, DEFAULT_SHUTDOWN_TIMEOUT};
use crate::log::LogLevel;
use std::path::PathBuf;
use std::time::Duration;

/// Complete configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    /// Executor settings
    pub executor: ExecutorSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

/// `[executor]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutorSettings {
    /// Maximum number of tasks running at once. Always greater than zero.
    pub capacity: usize,
    /// Time allowed for in-flight tasks to drain on shutdown.
    pub shutdown_timeout: Duration,
    /// Per-task wait bound applied by callers that want one.
    pub task_timeout: Option<Duration>,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            task_timeout: None,
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Optional log file, written in addition to stderr.
    pub file: Option<PathBuf>,
    /// Default level when `RUST_LOG` is not set.
    pub level: LogLevel,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            file: None,
            level: LogLevel::Info,
        }
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            executor: ExecutorSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}
