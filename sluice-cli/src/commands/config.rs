//! Configuration management CLI commands.
//!
//! Provides `config path`, `config show` and `config init`.

use clap::Subcommand;
use sluice::config::{config_file_path, format_duration, ConfigFile};
use std::path::PathBuf;

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the configuration file path
    Path,

    /// Show the effective configuration (file values over defaults)
    Show {
        /// Read this file instead of the default location
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Write a commented configuration file with default values
    Init {
        /// Write to this path instead of the default location
        #[arg(long)]
        config: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Path => run_path(),
        ConfigCommands::Show { config } => run_show(config),
        ConfigCommands::Init { config, force } => run_init(config, force),
    }
}

fn run_path() -> Result<(), CliError> {
    println!("{}", config_file_path().display());
    Ok(())
}

fn run_show(path: Option<PathBuf>) -> Result<(), CliError> {
    let path = path.unwrap_or_else(config_file_path);
    let config = ConfigFile::load_from(&path)?;

    if path.exists() {
        println!("# {}", path.display());
    } else {
        println!("# {} (not found, showing defaults)", path.display());
    }
    println!("executor.capacity = {}", config.executor.capacity);
    println!(
        "executor.shutdown_timeout = {}",
        format_duration(config.executor.shutdown_timeout)
    );
    println!(
        "executor.task_timeout = {}",
        config
            .executor
            .task_timeout
            .map(format_duration)
            .unwrap_or_else(|| "(none)".to_string())
    );
    println!(
        "logging.file = {}",
        config
            .logging
            .file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(stderr only)".to_string())
    );
    println!("logging.level = {}", config.logging.level);

    Ok(())
}

fn run_init(path: Option<PathBuf>, force: bool) -> Result<(), CliError> {
    let path = path.unwrap_or_else(config_file_path);

    if force {
        ConfigFile::default().save_to(&path)?;
        println!("Wrote {}", path.display());
    } else if ConfigFile::ensure_exists_at(&path)? {
        println!("Wrote {}", path.display());
    } else {
        println!(
            "{} already exists; use --force to overwrite",
            path.display()
        );
    }

    Ok(())
}
