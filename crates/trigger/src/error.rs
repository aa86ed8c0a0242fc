//! Trigger-subsystem errors.

/// Errors surfaced while registering a trigger.
///
/// Per `spec.md` §4.4: parse/registration failures are logged and the
/// workflow is abandoned rather than propagated — this type exists for the
/// handful of call sites (tests, explicit `Register` callers) that want the
/// reason rather than a log line.
#[derive(Debug, thiserror::Error)]
pub enum TriggerError {
    /// The workflow's `cronExpression` failed to parse.
    #[error("invalid cron expression '{expression}': {reason}")]
    InvalidCronExpression {
        /// The offending expression.
        expression: String,
        /// The parser's message.
        reason: String,
    },

    /// The trigger node's `parameters` were missing a required field.
    #[error("file-event trigger missing required parameter '{0}'")]
    MissingParameter(String),

    /// Installing the OS-level file watch failed.
    #[error("failed to watch path '{path}': {reason}")]
    WatchFailed {
        /// The path that could not be watched.
        path: String,
        /// The underlying error message.
        reason: String,
    },
}
