//! INI serialization logic for converting `ConfigFile` → INI string.

use super::duration::format_duration;
use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let task_timeout = config
        .executor
        .task_timeout
        .map(format_duration)
        .unwrap_or_default();
    let log_file = config
        .logging
        .file
        .as_ref()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default();

    format!(
        r#"[executor]
; Maximum number of tasks running at once (default: number of CPU cores)
capacity = {}
; Time allowed for running tasks to finish on shutdown (default: 5s)
; Supports: ms, s, m, h suffixes (e.g., 500ms, 5s, 1m)
shutdown_timeout = {}
; Wait bound for each task; leave empty for no timeout
; Tasks are not stopped on timeout, only abandoned by the caller
task_timeout = {}

[logging]
; Log file written in addition to stderr; leave empty for stderr only
file = {}
; Level used when RUST_LOG is not set: trace, debug, info, warn, error
level = {}
"#,
        config.executor.capacity,
        format_duration(config.executor.shutdown_timeout),
        task_timeout,
        log_file,
        config.logging.level,
    )
}
