//! Execution-layer errors.

use nebula_wf_core::ExecutionId;

/// Errors from execution record management (not from node execution itself
/// — see `nebula-wf-engine::error::EngineError` for that).
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ExecutionError {
    /// Attempted an illegal state machine transition.
    #[error("invalid execution transition: {from} -> {to}")]
    InvalidTransition {
        /// The status the execution was in.
        from: String,
        /// The status that was rejected.
        to: String,
    },

    /// No execution exists with the requested id.
    #[error("execution not found: {0}")]
    NotFound(ExecutionId),
}
