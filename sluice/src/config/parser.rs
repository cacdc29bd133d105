//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use ini::Ini;
use std::path::PathBuf;

use super::duration::parse_duration;
use super::file::ConfigFileError;
use super::settings::ConfigFile;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
/// Empty values keep the default.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [executor] section
    if let Some(section) = ini.section(Some("executor")) {
        if let Some(v) = non_empty(section.get("capacity")) {
            config.executor.capacity = match v.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(invalid(
                        "executor",
                        "capacity",
                        v,
                        "must be a positive integer",
                    ))
                }
            };
        }
        if let Some(v) = non_empty(section.get("shutdown_timeout")) {
            config.executor.shutdown_timeout = parse_duration(v).map_err(|_| {
                invalid(
                    "executor",
                    "shutdown_timeout",
                    v,
                    "expected format like '500ms', '5s', or '1m'",
                )
            })?;
        }
        if let Some(v) = non_empty(section.get("task_timeout")) {
            let timeout = parse_duration(v).map_err(|_| {
                invalid(
                    "executor",
                    "task_timeout",
                    v,
                    "expected format like '500ms', '5s', or '1m'",
                )
            })?;
            if timeout.is_zero() {
                return Err(invalid(
                    "executor",
                    "task_timeout",
                    v,
                    "must be greater than zero (leave empty for no timeout)",
                ));
            }
            config.executor.task_timeout = Some(timeout);
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = non_empty(section.get("file")) {
            config.logging.file = Some(expand_tilde(v));
        }
        if let Some(v) = non_empty(section.get("level")) {
            config.logging.level = v.parse().map_err(|_| {
                invalid(
                    "logging",
                    "level",
                    v,
                    "must be one of: trace, debug, info, warn, error",
                )
            })?;
        }
    }

    Ok(config)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Expand a leading `~` to the home directory.
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
