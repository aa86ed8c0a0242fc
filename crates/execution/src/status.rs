//! Execution-level and node-level status tracking.

use serde::{Deserialize, Serialize};

/// The overall status of a workflow execution (`spec.md` §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    /// Created but not yet running.
    Pending,
    /// Actively traversing the graph.
    Running,
    /// Paused, waiting on an external signal (step-debug).
    Waiting,
    /// Every trigger node (and its reachable subgraph) completed.
    Success,
    /// A node raised an error that was not treated as cancellation.
    Failed,
    /// The cancellation flag was observed before or during a node.
    Cancelled,
}

impl ExecutionStatus {
    /// `true` once the execution can never transition again.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failed | Self::Cancelled)
    }

    /// `true` if the execution ended successfully.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Waiting => "waiting",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

/// The status of a single node's execution within an [`crate::execution::Execution`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeExecutionStatus {
    /// The executor call returned successfully (or the node was a
    /// disabled pass-through).
    Success,
    /// The executor call raised an error.
    Failed,
    /// Cancellation was observed before the executor was invoked.
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(ExecutionStatus::Success.is_terminal());
        assert!(ExecutionStatus::Failed.is_terminal());
        assert!(ExecutionStatus::Cancelled.is_terminal());
        assert!(!ExecutionStatus::Pending.is_terminal());
        assert!(!ExecutionStatus::Running.is_terminal());
        assert!(!ExecutionStatus::Waiting.is_terminal());
    }

    #[test]
    fn serde_rename_screaming_snake() {
        let json = serde_json::to_string(&ExecutionStatus::Cancelled).unwrap();
        assert_eq!(json, "\"CANCELLED\"");
    }

    #[test]
    fn display_formatting() {
        assert_eq!(ExecutionStatus::Success.to_string(), "success");
    }
}
