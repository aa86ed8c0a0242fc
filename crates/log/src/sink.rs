//! The log sink interface (C2) and two reference sinks: a console
//! formatter and a capped HTTP-trace buffer.

use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::entry::LogEntry;
use crate::level::LogLevel;

/// Consumer of log entries.
///
/// Per `spec.md` §4.3, sink failures MUST be swallowed by the logger —
/// `handle` therefore does not return a `Result`; a sink that wants to
/// signal trouble does so via its own side channel (e.g. a counter) and
/// must not panic across the call. [`crate::logger::ExecutionLogger`]
/// additionally wraps each call in `catch_unwind` as a last resort so one
/// misbehaving sink can never take down an execution.
pub trait LogSink: Send + Sync {
    /// Handle one log entry.
    fn handle(&self, entry: &LogEntry);
}

/// Formats entries to stdout/stderr, filtered by a minimum level.
///
/// Grounded on the `execution.logLevel` configuration option (`spec.md`
/// §6): entries below the configured level are dropped before formatting.
pub struct ConsoleSink {
    min_level: LogLevel,
}

impl ConsoleSink {
    /// Create a console sink that only prints entries at or above
    /// `min_level`.
    #[must_use]
    pub fn new(min_level: LogLevel) -> Self {
        Self { min_level }
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new(LogLevel::Info)
    }
}

impl LogSink for ConsoleSink {
    fn handle(&self, entry: &LogEntry) {
        if entry.level < self.min_level {
            return;
        }
        let line = format!(
            "[{}] {} {:?} {}",
            entry.timestamp.to_rfc3339(),
            entry.level,
            entry.category,
            entry.message
        );
        if entry.level >= LogLevel::Error {
            eprintln!("{line}");
        } else {
            println!("{line}");
        }
    }
}

/// A bounded ring buffer of the most recent entries, intended to back an
/// HTTP trace-inspection endpoint.
pub struct HttpTraceSink {
    capacity: usize,
    buffer: Mutex<VecDeque<LogEntry>>,
}

impl HttpTraceSink {
    /// Create a sink retaining at most `capacity` entries.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            buffer: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Snapshot the currently buffered entries, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.buffer.lock().iter().cloned().collect()
    }

    /// Number of entries currently buffered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.lock().len()
    }

    /// `true` if nothing has been buffered yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LogSink for HttpTraceSink {
    fn handle(&self, entry: &LogEntry) {
        let mut buf = self.buffer.lock();
        if buf.len() == self.capacity {
            buf.pop_front();
        }
        buf.push_back(entry.clone());
    }
}
