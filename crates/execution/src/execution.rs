//! The execution record: one run of a workflow.

use chrono::{DateTime, Utc};
use nebula_wf_core::{ExecutionId, WorkflowId};
use nebula_wf_model::TriggerType;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ExecutionError;
use crate::node_execution::NodeExecution;
use crate::status::ExecutionStatus;
use crate::transition::validate_transition;

/// One run of a workflow (`spec.md` §3).
///
/// While `RUNNING`, this record is exclusively owned by the execution
/// engine; the [`crate::store::ExecutionStore`] owns the durable copy.
/// Invariant: `finished_at >= started_at` once terminal; once terminal, no
/// field other than diagnostic metadata changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Execution {
    /// Unique execution identifier.
    pub id: ExecutionId,
    /// The workflow this execution ran.
    #[serde(rename = "workflowId")]
    pub workflow_id: WorkflowId,
    /// Which trigger submitted this execution.
    #[serde(rename = "triggerType")]
    pub trigger_type: TriggerType,
    /// Current lifecycle status.
    pub status: ExecutionStatus,
    /// When the execution was submitted.
    #[serde(rename = "startedAt")]
    pub started_at: DateTime<Utc>,
    /// When the execution reached a terminal status.
    #[serde(default, rename = "finishedAt")]
    pub finished_at: Option<DateTime<Utc>>,
    /// The workflow-level input, serialized verbatim.
    #[serde(rename = "inputData")]
    pub input_data: Value,
    /// The final output (last trigger node's output), once terminal.
    #[serde(default, rename = "outputData")]
    pub output_data: Option<Value>,
    /// The top-level error message, if `status == FAILED`.
    #[serde(default, rename = "errorMessage")]
    pub error_message: Option<String>,
    /// Per-node history, appended as nodes complete.
    #[serde(default, rename = "nodeExecutions")]
    pub node_executions: Vec<NodeExecution>,
}

impl Execution {
    /// Create a new execution record in the `RUNNING` status, as the engine
    /// does at submission time (`spec.md` §4.1 step 3).
    #[must_use]
    pub fn start(
        workflow_id: WorkflowId,
        trigger_type: TriggerType,
        input_data: Value,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ExecutionId::v4(),
            workflow_id,
            trigger_type,
            status: ExecutionStatus::Running,
            started_at,
            finished_at: None,
            input_data,
            output_data: None,
            error_message: None,
            node_executions: Vec::new(),
        }
    }

    /// Transition to a terminal status, recording `finished_at`.
    ///
    /// Returns an error if `to` is not a legal transition from the current
    /// status (`spec.md` §4.1 state machine — only forward transitions,
    /// terminal states are sinks).
    pub fn finish(
        &mut self,
        to: ExecutionStatus,
        finished_at: DateTime<Utc>,
        output_data: Option<Value>,
        error_message: Option<String>,
    ) -> Result<(), ExecutionError> {
        validate_transition(self.status, to)?;
        debug_assert!(finished_at >= self.started_at);
        self.status = to;
        self.finished_at = Some(finished_at);
        self.output_data = output_data;
        self.error_message = error_message;
        Ok(())
    }

    /// Mark the execution as waiting on a step-debug signal.
    pub fn wait(&mut self) -> Result<(), ExecutionError> {
        validate_transition(self.status, ExecutionStatus::Waiting)?;
        self.status = ExecutionStatus::Waiting;
        Ok(())
    }

    /// Resume from `Waiting` back to `Running`.
    pub fn resume(&mut self) -> Result<(), ExecutionError> {
        validate_transition(self.status, ExecutionStatus::Running)?;
        self.status = ExecutionStatus::Running;
        Ok(())
    }

    /// Append a node execution record. Safe to call from parallel fan-out
    /// only if the caller synchronizes access to `self` — the engine holds
    /// the live record behind an `Arc<parking_lot::Mutex<Vec<NodeExecution>>>`
    /// while an execution is running, and calls this once per node under
    /// that lock.
    pub fn record_node(&mut self, record: NodeExecution) {
        self.node_executions.push(record);
    }
}
