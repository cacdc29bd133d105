//! In-process logger sinks.

use crate::log::{LogLevel, Logger};
use std::fmt::Arguments;
use std::sync::Mutex;

/// A logger that discards all messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpLogger;

impl Logger for NoOpLogger {
    #[inline]
    fn log(&self, _level: LogLevel, _args: Arguments<'_>) {}
}

/// A logger that records every line in memory.
///
/// Handy when a caller wants to attach executor diagnostics to a report of
/// its own, and in tests asserting that a panic or timeout was logged.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    lines: Mutex<Vec<(LogLevel, String)>>,
}

impl MemoryLogger {
    /// Creates an empty memory logger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of all recorded lines, oldest first.
    pub fn lines(&self) -> Vec<(LogLevel, String)> {
        match self.lines.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Returns the recorded messages at `level`.
    pub fn messages_at(&self, level: LogLevel) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, msg)| msg)
            .collect()
    }

    /// Returns true if any recorded line contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|(_, msg)| msg.contains(needle))
    }

    /// Number of recorded lines.
    pub fn len(&self) -> usize {
        self.lines().len()
    }

    /// Returns true if nothing has been logged.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Discards all recorded lines.
    pub fn clear(&self) {
        match self.lines.lock() {
            Ok(mut guard) => guard.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }
}

impl Logger for MemoryLogger {
    fn log(&self, level: LogLevel, args: Arguments<'_>) {
        let line = args.to_string();
        match self.lines.lock() {
            Ok(mut guard) => guard.push((level, line)),
            // A panicking writer must not silence later diagnostics.
            Err(poisoned) => poisoned.into_inner().push((level, line)),
        }
    }
}
