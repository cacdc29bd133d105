//! Configuration file support.
//!
//! Settings are read from an INI file, by default `~/.sluice/config.ini`:
//!
//! ```ini
//! [executor]
//! capacity = 8
//! shutdown_timeout = 5s
//! task_timeout = 30s
//!
//! [logging]
//! file = ~/.sluice/sluice.log
//! level = info
//! ```
//!
//! A missing file yields defaults. Build an executor from the `[executor]`
//! section with [`Executor::from_settings`](crate::executor::Executor::from_settings).

mod duration;
mod file;
mod parser;
mod settings;
mod writer;

pub use duration::{format_duration, parse_duration, DurationParseError};
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{ConfigFile, ExecutorSettings, LoggingSettings};
