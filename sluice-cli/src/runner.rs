//! CLI runner for common setup.
//!
//! Loads configuration and initializes logging once per command.

use crate::error::CliError;
use sluice::config::ConfigFile;
use sluice::logging::{init_logging, LoggingGuard};
use std::path::Path;
use tracing::info;

/// Runner that manages CLI lifecycle.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    /// Loaded configuration file
    config: ConfigFile,
}

impl CliRunner {
    /// Load config (from `config_path`, else the default location) and
    /// initialize logging.
    ///
    /// * `debug_mode` - When true, lowers the default level to debug
    pub fn new(config_path: Option<&Path>, debug_mode: bool) -> Result<Self, CliError> {
        let config = match config_path {
            Some(path) => ConfigFile::load_from(path)?,
            None => ConfigFile::load()?,
        };

        let logging_guard = init_logging(&config.logging, debug_mode)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("Sluice v{}", sluice::VERSION);
        info!("Sluice CLI: {} command", command);
    }
}
