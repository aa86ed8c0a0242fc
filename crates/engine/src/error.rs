//! The closed set of engine error kinds (`spec.md` §7).

use nebula_wf_core::{NodeId, WorkflowId};
use nebula_wf_node::RegistryError;

/// Errors surfaced by [`crate::engine::WorkflowEngine`].
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// `workflowId` did not resolve via `WorkflowStore.FindById`.
    #[error("workflow not found: {0}")]
    WorkflowNotFound(WorkflowId),

    /// The workflow has no node with zero incoming connections.
    #[error("workflow has no trigger nodes")]
    NoTriggerNodes,

    /// No executor is registered for a node type reached during traversal.
    #[error("no executor registered for node type '{0}'")]
    NoExecutor(String),

    /// An executor raised while running a node.
    #[error("node {node_id} ({node_type}) failed: {cause}")]
    NodeExecutionFailed {
        /// The node that failed.
        node_id: NodeId,
        /// That node's type.
        node_type: String,
        /// The executor's error message.
        cause: String,
    },

    /// The cancellation flag was observed before or during a node.
    #[error("execution cancelled{}", node_id.map(|id| format!(" at node {id}")).unwrap_or_default())]
    Cancelled {
        /// The node being evaluated when cancellation was observed, if any.
        node_id: Option<NodeId>,
        /// That node's type, if known.
        node_type: Option<String>,
    },

    /// A sibling task raised during parallel fan-out.
    #[error("parallel execution failed: {cause}")]
    ParallelExecutionFailed {
        /// The first sibling error's message.
        cause: String,
    },

    /// The underlying task-spawning primitive was interrupted (e.g. the
    /// spawned task panicked).
    #[error("interrupted: {0}")]
    Interrupted(String),

    /// Deserializing workflow or execution JSON failed.
    #[error("failed to parse field '{field}': {message}")]
    DataParsing {
        /// The field that failed to parse.
        field: String,
        /// The underlying parser message.
        message: String,
    },

    /// Registry integrity violation surfaced while registering/looking up
    /// an executor.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The workflow failed its own well-formedness validation.
    #[error(transparent)]
    WorkflowValidation(#[from] nebula_wf_model::WorkflowValidationError),

    /// The configured `WorkflowStore` failed.
    #[error(transparent)]
    WorkflowStore(#[from] nebula_wf_model::WorkflowStoreError),

    /// An execution-record transition was rejected.
    #[error(transparent)]
    Execution(#[from] nebula_wf_execution::ExecutionError),
}

impl EngineError {
    /// `true` if this error kind represents the execution observing its
    /// own cancellation flag, as opposed to a genuine failure.
    #[must_use]
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}
