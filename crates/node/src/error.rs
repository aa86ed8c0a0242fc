//! Errors raised by executors and the executor registry.

use thiserror::Error;

/// An error raised by an [`crate::executor::NodeExecutor::execute`] call.
///
/// Carries only a message; the engine wraps this as
/// `NodeExecutionFailed{nodeId, nodeType, cause}` (`spec.md` §7) when it
/// propagates the failure.
#[derive(Debug, Error, Clone)]
#[error("{0}")]
pub struct ExecutorError(pub String);

impl ExecutorError {
    /// Construct from any displayable message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<String> for ExecutorError {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ExecutorError {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Registry integrity errors (`spec.md` §7 item 9).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// `Register` was called with a node type that is already present.
    #[error("duplicate node type: {0}")]
    DuplicateNodeType(String),
    /// `Get`/`Unregister` was called with a node type not present.
    #[error("unknown node type: {0}")]
    UnknownNodeType(String),
}
