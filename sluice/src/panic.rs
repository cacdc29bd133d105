//! Panic guard for task bodies.
//!
//! Every task the executor runs is wrapped by a [`PanicGuard`]. A panic
//! raised while the task is being created or polled is caught with
//! `catch_unwind`, reported through the executor's logger (payload, location
//! and backtrace) and turned into an [`ExecutorError::Panic`] result. A panic
//! never leaves the unit of execution that ran the task.
//!
//! # Panic hook
//!
//! By the time `catch_unwind` returns, the stack that panicked is gone. To
//! keep the interesting backtrace, [`install_hook`] registers a process panic
//! hook (once) that runs on the panicking thread *before* unwinding. While a
//! guarded task is being polled on that thread, the hook stores the location
//! and a forced backtrace in a thread-local slot and skips the default stderr
//! report; the guard picks the capture up after unwinding. Panics raised
//! anywhere else are passed to the previously installed hook untouched.

use crate::executor::{ExecutorError, TaskError};
use crate::log::Logger;
use crate::log_error;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe, PanicHookInfo};
use std::pin::Pin;
use std::sync::{Arc, Once};
use std::task::{Context, Poll};

static HOOK: Once = Once::new();

thread_local! {
    /// Number of guarded calls active on this thread.
    static GUARD_DEPTH: Cell<usize> = const { Cell::new(0) };

    /// Last panic captured by the hook while a guard was active.
    static CAPTURED: RefCell<Option<Capture>> = const { RefCell::new(None) };
}

/// Location and backtrace recorded by the hook at the panic site.
struct Capture {
    location: Option<String>,
    backtrace: String,
}

/// Installs the capturing panic hook.
///
/// Called by every executor constructor; only the first call has an effect.
/// The previous hook is kept and still handles panics outside guarded tasks.
pub fn install_hook() {
    HOOK.call_once(|| {
        let original_hook = panic::take_hook();
        panic::set_hook(Box::new(move |info: &PanicHookInfo<'_>| {
            if GUARD_DEPTH.with(Cell::get) > 0 {
                capture(info);
            } else {
                original_hook(info);
            }
        }));
    });
}

fn capture(info: &PanicHookInfo<'_>) {
    let location = info
        .location()
        .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()));
    let backtrace = Backtrace::force_capture().to_string();
    CAPTURED.with(|slot| {
        *slot.borrow_mut() = Some(Capture {
            location,
            backtrace,
        });
    });
}

fn take_capture() -> Option<Capture> {
    CAPTURED.with(|slot| slot.borrow_mut().take())
}

/// Marks the current thread as running guarded code for its lifetime.
///
/// The outermost guard owns the capture slot: it starts with an empty slot,
/// and a normal exit discards whatever a panic caught inside the task left
/// behind. Only an unwinding exit keeps the capture for the catch site.
struct DepthGuard;

impl DepthGuard {
    fn enter() -> Self {
        let outermost = GUARD_DEPTH.with(|d| {
            let depth = d.get();
            d.set(depth + 1);
            depth == 0
        });
        if outermost {
            take_capture();
        }
        Self
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        let outermost = GUARD_DEPTH.with(|d| {
            let depth = d.get().saturating_sub(1);
            d.set(depth);
            depth == 0
        });
        if outermost && !std::thread::panicking() {
            take_capture();
        }
    }
}

/// Future adapter that flags the polling thread as guarded during each poll.
struct Guarded<T> {
    inner: BoxFuture<'static, T>,
}

impl<T> Future for Guarded<T> {
    type Output = T;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<T> {
        let _depth = DepthGuard::enter();
        self.inner.as_mut().poll(cx)
    }
}

// =============================================================================
// Panic Fault
// =============================================================================

/// A panic recovered from a task body.
#[derive(Debug, Clone)]
pub struct PanicFault {
    message: String,
    location: Option<String>,
    backtrace: String,
}

impl PanicFault {
    /// Builds a fault from a `catch_unwind` payload, consuming the capture
    /// the hook left for this thread if there is one.
    fn from_payload(payload: Box<dyn Any + Send>) -> Self {
        let message = payload_message(payload.as_ref());
        match take_capture() {
            Some(capture) => Self {
                message,
                location: capture.location,
                backtrace: capture.backtrace,
            },
            None => Self {
                message,
                location: None,
                backtrace: Backtrace::force_capture().to_string(),
            },
        }
    }

    /// The panic message (`"<non-string panic payload>"` when the payload
    /// was not a string).
    pub fn message(&self) -> &str {
        &self.message
    }

    /// `file:line:column` of the panic, when the hook captured it.
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// Rendered backtrace.
    pub fn backtrace(&self) -> &str {
        &self.backtrace
    }
}

impl fmt::Display for PanicFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "task panicked at {}: {}", location, self.message),
            None => write!(f, "task panicked: {}", self.message),
        }
    }
}

impl std::error::Error for PanicFault {}

/// Extracts a readable message from a panic payload.
fn payload_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "<non-string panic payload>".to_string()
    }
}

/// Runs a synchronous closure, converting a panic into a [`PanicFault`].
///
/// Used for blocking task bodies, which run on a different thread than the
/// async guard.
pub fn catch_sync<R>(f: impl FnOnce() -> R) -> Result<R, PanicFault> {
    install_hook();
    panic::catch_unwind(AssertUnwindSafe(|| {
        let _depth = DepthGuard::enter();
        f()
    }))
    .map_err(PanicFault::from_payload)
}

// =============================================================================
// Panic Guard
// =============================================================================

/// Call-boundary fault barrier around task invocations.
#[derive(Clone)]
pub struct PanicGuard {
    logger: Arc<dyn Logger>,
}

impl PanicGuard {
    /// Creates a guard reporting recovered panics to `logger`.
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        install_hook();
        Self { logger }
    }

    /// Polls `body` to completion, recovering from any panic on the way.
    ///
    /// `body` should perform the task invocation itself so that a panic in
    /// the synchronous part of the call is caught as well. Task errors that
    /// wrap a [`PanicFault`] (blocking bodies) are classified as panics too.
    pub async fn run<T, F>(&self, label: impl fmt::Display, body: F) -> Result<T, ExecutorError>
    where
        T: Send + 'static,
        F: Future<Output = Result<T, TaskError>> + Send + 'static,
    {
        let guarded = Guarded {
            inner: body.boxed(),
        };
        let fault = match AssertUnwindSafe(guarded).catch_unwind().await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(err)) => match err.downcast::<PanicFault>() {
                Ok(fault) => *fault,
                Err(err) => return Err(ExecutorError::Task(err)),
            },
            Err(payload) => PanicFault::from_payload(payload),
        };

        log_error!(
            self.logger,
            "{} panicked: {}\n{}",
            label,
            fault,
            fault.backtrace()
        );
        Err(ExecutorError::Panic(fault))
    }
}

impl fmt::Debug for PanicGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PanicGuard").finish_non_exhaustive()
    }
}
