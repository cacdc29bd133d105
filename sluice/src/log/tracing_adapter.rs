//! Tracing library adapter implementation.

use crate::log::{LogLevel, Logger};
use std::borrow::Cow;
use std::fmt::Arguments;

/// Logger implementation that delegates to the `tracing` crate.
///
/// Every event carries a `component` field so output from several executors
/// sharing one subscriber can be told apart.
///
/// ```
/// use sluice::log::{Logger, TracingLogger};
/// use std::sync::Arc;
///
/// let logger: Arc<dyn Logger> = Arc::new(TracingLogger::with_component("ingest"));
/// logger.info(format_args!("using tracing backend"));
/// ```
#[derive(Debug, Clone)]
pub struct TracingLogger {
    component: Cow<'static, str>,
}

/// Component name used when none is given.
const DEFAULT_COMPONENT: &str = "executor";

impl Default for TracingLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl TracingLogger {
    /// Create a tracing logger tagged with the default component name.
    pub fn new() -> Self {
        Self {
            component: Cow::Borrowed(DEFAULT_COMPONENT),
        }
    }

    /// Create a tracing logger tagged with `component`.
    pub fn with_component(component: impl Into<Cow<'static, str>>) -> Self {
        Self {
            component: component.into(),
        }
    }

    /// Returns the component tag attached to every event.
    pub fn component(&self) -> &str {
        &self.component
    }
}

impl Logger for TracingLogger {
    fn log(&self, level: LogLevel, args: Arguments<'_>) {
        let component = self.component.as_ref();
        match level {
            LogLevel::Trace => tracing::trace!(component, "{}", args),
            LogLevel::Debug => tracing::debug!(component, "{}", args),
            LogLevel::Info => tracing::info!(component, "{}", args),
            LogLevel::Warn => tracing::warn!(component, "{}", args),
            LogLevel::Error => tracing::error!(component, "{}", args),
        }
    }
}
