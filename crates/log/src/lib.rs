//! Structured, category-tagged execution logging (C2 Log Sink Interface,
//! C3 Execution Logger).
//!
//! Entries are kept in memory per execution until explicitly cleared, and
//! fanned out synchronously to every registered [`LogSink`]. A sink panic
//! or slow sink never fails the execution it's logging.

pub mod category;
pub mod entry;
pub mod level;
pub mod logger;
pub mod sink;
pub mod summary;

pub use category::LogCategory;
pub use entry::{preview, truncate, LogContext, LogEntry};
pub use level::LogLevel;
pub use logger::ExecutionLogger;
pub use sink::{ConsoleSink, HttpTraceSink, LogSink};
pub use summary::ExecutionLogSummary;
