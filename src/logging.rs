//! Pluggable log sink for machine diagnostics.
//!
//! Every message carries the [`InstanceId`] of the machine that produced it
//! so logs from concurrent machines can be told apart. The default sink
//! forwards to `tracing`.

use crate::executor::panic_message;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(0);

/// Log-correlation identifier of a machine instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstanceId(u64);

impl InstanceId {
    /// Use a caller-chosen identifier.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Take the next identifier from the process-wide counter.
    ///
    /// Identifiers are unique among machines that did not pick their own.
    pub fn next() -> Self {
        Self(NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Severity of a machine log message, lowest first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        };
        f.write_str(name)
    }
}

/// Destination for machine log messages.
pub trait LogSink: Send + Sync {
    /// Record a fully formatted message.
    fn log(&self, instance: InstanceId, level: Level, message: &str);

    /// Whether messages at `level` would be recorded.
    ///
    /// The engine asks before formatting debug and trace messages.
    fn is_enabled(&self, _level: Level) -> bool {
        true
    }
}

/// Sink that forwards to `tracing` events with an `instance` field.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, instance: InstanceId, level: Level, message: &str) {
        match level {
            Level::Trace => tracing::trace!(target: "strictmachine", %instance, "{message}"),
            Level::Debug => tracing::debug!(target: "strictmachine", %instance, "{message}"),
            Level::Info => tracing::info!(target: "strictmachine", %instance, "{message}"),
            Level::Warn => tracing::warn!(target: "strictmachine", %instance, "{message}"),
            Level::Error => tracing::error!(target: "strictmachine", %instance, "{message}"),
        }
    }

    fn is_enabled(&self, level: Level) -> bool {
        match level {
            Level::Trace => tracing::enabled!(target: "strictmachine", tracing::Level::TRACE),
            Level::Debug => tracing::enabled!(target: "strictmachine", tracing::Level::DEBUG),
            Level::Info => tracing::enabled!(target: "strictmachine", tracing::Level::INFO),
            Level::Warn => tracing::enabled!(target: "strictmachine", tracing::Level::WARN),
            Level::Error => tracing::enabled!(target: "strictmachine", tracing::Level::ERROR),
        }
    }
}

/// Sink that discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl LogSink for NoopSink {
    fn log(&self, _instance: InstanceId, _level: Level, _message: &str) {}

    fn is_enabled(&self, _level: Level) -> bool {
        false
    }
}

/// Build a sink from a closure.
///
/// ```rust
/// use strictmachine::logging::{sink_fn, Level, LogSink, InstanceId};
///
/// let sink = sink_fn(|instance, level, message| eprintln!("[{instance}] {level}: {message}"));
/// sink.log(InstanceId::new(7), Level::Info, "hello");
/// ```
pub fn sink_fn<F>(f: F) -> impl LogSink
where
    F: Fn(InstanceId, Level, &str) + Send + Sync + 'static,
{
    FnSink(f)
}

struct FnSink<F>(F);

impl<F> LogSink for FnSink<F>
where
    F: Fn(InstanceId, Level, &str) + Send + Sync + 'static,
{
    fn log(&self, instance: InstanceId, level: Level, message: &str) {
        (self.0)(instance, level, message)
    }
}

/// Instance-bound handle the engine logs through.
#[derive(Clone)]
pub(crate) struct Logger {
    instance: InstanceId,
    sink: Arc<dyn LogSink>,
    min_level: Level,
}

impl Logger {
    pub(crate) fn new(instance: InstanceId, sink: Arc<dyn LogSink>, min_level: Level) -> Self {
        Self {
            instance,
            sink,
            min_level,
        }
    }

    pub(crate) fn instance(&self) -> InstanceId {
        self.instance
    }

    /// A sink that panics while answering counts as disabled.
    pub(crate) fn is_enabled(&self, level: Level) -> bool {
        if level < self.min_level {
            return false;
        }
        let answer = AssertUnwindSafe(|| self.sink.is_enabled(level));
        panic::catch_unwind(answer).unwrap_or(false)
    }

    /// Hand `message` to the sink. A panicking sink loses the message but
    /// never unwinds into the caller.
    pub(crate) fn log(&self, level: Level, message: fmt::Arguments<'_>) {
        if !self.is_enabled(level) {
            return;
        }
        let message = message.to_string();
        let deliver = AssertUnwindSafe(|| self.sink.log(self.instance, level, &message));
        if let Err(payload) = panic::catch_unwind(deliver) {
            tracing::error!(
                target: "strictmachine",
                instance = %self.instance,
                %level,
                panic = %panic_message(payload.as_ref()),
                "Log sink panicked, message dropped"
            );
        }
    }

    pub(crate) fn trace(&self, message: fmt::Arguments<'_>) {
        self.log(Level::Trace, message);
    }

    pub(crate) fn debug(&self, message: fmt::Arguments<'_>) {
        self.log(Level::Debug, message);
    }

    pub(crate) fn warn(&self, message: fmt::Arguments<'_>) {
        self.log(Level::Warn, message);
    }
}
