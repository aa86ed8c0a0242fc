//! Per-node execution records.

use chrono::{DateTime, Utc};
use nebula_wf_core::{NodeExecutionId, NodeId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::status::NodeExecutionStatus;

/// One node's contribution to an [`crate::execution::Execution`]'s history.
///
/// Appended, never rewritten (`spec.md` §3). Parallel fan-out appends from
/// sibling tasks, so the owning collection must synchronize appends — the
/// engine holds these behind an `Arc<parking_lot::Mutex<Vec<NodeExecution>>>`
/// for the lifetime of a running execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeExecution {
    /// Unique id for this record.
    pub id: NodeExecutionId,
    /// The node this record describes.
    #[serde(rename = "nodeId")]
    pub node_id: NodeId,
    /// Outcome of this node invocation.
    pub status: NodeExecutionStatus,
    /// When the node began executing.
    #[serde(rename = "startedAt")]
    pub started_at: DateTime<Utc>,
    /// When the node finished (successfully, with an error, or cancelled).
    #[serde(rename = "finishedAt")]
    pub finished_at: DateTime<Utc>,
    /// The node's raw output, if it succeeded.
    #[serde(default)]
    pub output: Option<Value>,
    /// The error message, if it failed.
    #[serde(default)]
    pub error: Option<String>,
}

impl NodeExecution {
    /// Build a SUCCESS record.
    #[must_use]
    pub fn success(node_id: NodeId, started_at: DateTime<Utc>, finished_at: DateTime<Utc>, output: Value) -> Self {
        Self {
            id: NodeExecutionId::v4(),
            node_id,
            status: NodeExecutionStatus::Success,
            started_at,
            finished_at,
            output: Some(output),
            error: None,
        }
    }

    /// Build a FAILED record.
    #[must_use]
    pub fn failed(node_id: NodeId, started_at: DateTime<Utc>, finished_at: DateTime<Utc>, error: impl Into<String>) -> Self {
        Self {
            id: NodeExecutionId::v4(),
            node_id,
            status: NodeExecutionStatus::Failed,
            started_at,
            finished_at,
            output: None,
            error: Some(error.into()),
        }
    }

    /// Build a CANCELLED record.
    #[must_use]
    pub fn cancelled(node_id: NodeId, started_at: DateTime<Utc>, finished_at: DateTime<Utc>) -> Self {
        Self {
            id: NodeExecutionId::v4(),
            node_id,
            status: NodeExecutionStatus::Cancelled,
            started_at,
            finished_at,
            output: None,
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_record_carries_output() {
        let now = Utc::now();
        let rec = NodeExecution::success(NodeId::v4(), now, now, serde_json::json!({"x": 1}));
        assert!(rec.output.is_some());
        assert!(rec.error.is_none());
    }

    #[test]
    fn failed_record_carries_error() {
        let now = Utc::now();
        let rec = NodeExecution::failed(NodeId::v4(), now, now, "boom");
        assert_eq!(rec.error.as_deref(), Some("boom"));
        assert!(rec.output.is_none());
    }
}
