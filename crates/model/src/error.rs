//! Errors raised while validating or looking up workflows.

use nebula_wf_core::{ConnectionId, NodeId, WorkflowId};

/// Reasons a [`crate::workflow::Workflow`] fails well-formedness checks.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum WorkflowValidationError {
    /// Two or more nodes share the same id.
    #[error("duplicate node id: {0}")]
    DuplicateNodeId(NodeId),

    /// A connection references a node that does not exist.
    #[error("connection {0} references unknown node {1}")]
    DanglingConnection(ConnectionId, NodeId),

    /// No node has zero incoming connections.
    #[error("workflow has no entry node")]
    NoEntryNode,

    /// A cycle was found along non-loop edges.
    #[error("cycle detected at node {0}")]
    CycleDetected(NodeId),
}

/// Errors from the [`crate::store::WorkflowStore`] collaborator interface.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum WorkflowStoreError {
    /// No workflow exists with the requested id.
    #[error("workflow not found: {0}")]
    NotFound(WorkflowId),

    /// The underlying store failed to deserialize a persisted workflow.
    #[error("failed to parse workflow field {field}: {message}")]
    DataParsing {
        /// The offending field name.
        field: String,
        /// Parser diagnostic.
        message: String,
    },
}
