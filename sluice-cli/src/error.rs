//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use sluice::config::ConfigFileError;
use sluice::executor::{BuildError, ExecutorError};
use std::fmt;
use std::process;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Failed to start the async runtime
    Runtime(std::io::Error),
    /// Failed to create the executor
    ExecutorCreation(BuildError),
    /// Executor did not shut down cleanly
    Shutdown(ExecutorError),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Config(_) => {
                eprintln!();
                eprintln!("Check the file with: sluice config show");
                eprintln!("Or write a fresh one with: sluice config init");
            }
            CliError::Shutdown(ExecutorError::ShutdownTimeout { .. }) => {
                eprintln!();
                eprintln!("Some tasks ignored cancellation. Raise shutdown_timeout in the");
                eprintln!("[executor] section if they need longer to finish.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Runtime(e) => write!(f, "Failed to start runtime: {}", e),
            CliError::ExecutorCreation(e) => write!(f, "Failed to create executor: {}", e),
            CliError::Shutdown(e) => write!(f, "Shutdown failed: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Runtime(e) => Some(e),
            CliError::ExecutorCreation(e) => Some(e),
            CliError::Shutdown(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<BuildError> for CliError {
    fn from(e: BuildError) -> Self {
        CliError::ExecutorCreation(e)
    }
}
