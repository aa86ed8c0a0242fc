//! The closed set of execution log categories (`spec.md` §4.3).

use serde::{Deserialize, Serialize};

/// A log entry's category, used by sinks and exporters to filter/group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogCategory {
    /// An execution began.
    ExecutionStart,
    /// An execution reached a terminal status.
    ExecutionEnd,
    /// A node began executing.
    NodeStart,
    /// A node finished executing (success or failure).
    NodeEnd,
    /// A disabled node was passed through without invoking an executor.
    NodeSkip,
    /// The input snapshot handed to a node.
    NodeInput,
    /// The output snapshot produced by a node.
    NodeOutput,
    /// Data moving between nodes outside the input/output snapshot pair.
    DataFlow,
    /// A named variable's value was recorded.
    Variable,
    /// An expression was evaluated (reserved for executor-level use; the
    /// core engine does not evaluate expressions itself — `spec.md` §1
    /// Non-goals).
    ExpressionEval,
    /// An error occurred.
    Error,
    /// An executor-level retry was attempted.
    Retry,
    /// A rate limit was hit or approached.
    RateLimit,
    /// A timing/performance measurement.
    Performance,
    /// Anything not covered by the above.
    Custom,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_rename() {
        let json = serde_json::to_string(&LogCategory::NodeStart).unwrap();
        assert_eq!(json, "\"NODE_START\"");
    }
}
