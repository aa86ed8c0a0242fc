//! The pluggable node-type capability (`spec.md` §4.2).

use async_trait::async_trait;
use nebula_wf_model::{Node, ParameterMap};
use serde_json::Value;

use crate::context::ExecutionContext;
use crate::error::ExecutorError;

/// Result of validating a node's settings before execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    errors: Vec<String>,
}

impl ValidationResult {
    /// No problems found.
    #[must_use]
    pub fn ok() -> Self {
        Self::default()
    }

    /// Settings are invalid; `errors` should be human-readable.
    #[must_use]
    pub fn invalid(errors: Vec<String>) -> Self {
        Self { errors }
    }

    /// `true` if no errors were recorded.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// The recorded validation errors, if any.
    #[must_use]
    pub fn errors(&self) -> &[String] {
        &self.errors
    }
}

/// A pluggable implementation of a node type.
///
/// A single instance services every invocation of its node type across all
/// executions (`spec.md` §4.2) — implementations MUST be safe for
/// concurrent invocation and must not hold per-call mutable state in
/// `&self`.
#[async_trait]
pub trait NodeExecutor: Send + Sync {
    /// Stable identifier; the key under which this executor is registered
    /// in the [`crate::registry::ExecutorRegistry`].
    fn node_type(&self) -> &str;

    /// Run this node. `input` is the map routed from upstream (or the
    /// workflow input, for trigger nodes); the returned map becomes this
    /// node's output and is routed to its children per `spec.md` §4.1.
    async fn execute(&self, node: &Node, input: Value, ctx: &ExecutionContext) -> Result<Value, ExecutorError>;

    /// Validate a node's settings ahead of execution. The default
    /// implementation accepts everything — most executors have no
    /// structural constraints worth checking upfront.
    fn validate(&self, _settings: &ParameterMap) -> ValidationResult {
        ValidationResult::ok()
    }

    /// Best-effort cooperative cancellation of any in-flight work owned by
    /// this executor instance (not a specific invocation — the engine has
    /// no handle to an in-flight call, only to the shared executor).
    fn cancel(&self) {}
}
