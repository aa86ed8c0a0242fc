//! Workflow node definitions.

use std::collections::HashMap;

use nebula_wf_core::NodeId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Opaque string-keyed parameter/settings bag.
///
/// Kept as a plain JSON map rather than a typed struct: node-type-specific
/// parameter shapes live in plugins, which are out of scope here (§1
/// Non-goals — "no node-type semantics").
pub type ParameterMap = HashMap<String, Value>;

/// A single step in a workflow graph.
///
/// See `spec.md` §3 — `Node`: id, type, name, position (editor-only,
/// ignored here), parameters, credentialId?, disabled flag, notes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Unique (within the owning workflow) node identifier.
    pub id: NodeId,
    /// Node type — key into the executor registry (C4).
    #[serde(rename = "type")]
    pub node_type: String,
    /// Human-readable label.
    pub name: String,
    /// Opaque, node-type-specific parameters.
    #[serde(default)]
    pub parameters: ParameterMap,
    /// Id of a credential this node should be able to resolve, if any.
    #[serde(default, rename = "credentialId")]
    pub credential_id: Option<String>,
    /// Disabled nodes pass their input through unchanged (§4.1 step 2).
    #[serde(default)]
    pub disabled: bool,
    /// Free-text author notes; carried verbatim, never interpreted.
    #[serde(default)]
    pub notes: Option<String>,
}

impl Node {
    /// Construct a minimal node for tests and programmatic workflow
    /// construction.
    #[must_use]
    pub fn new(id: NodeId, node_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            node_type: node_type.into(),
            name: name.into(),
            parameters: ParameterMap::new(),
            credential_id: None,
            disabled: false,
            notes: None,
        }
    }

    /// Builder-style setter for parameters.
    #[must_use]
    pub fn with_parameters(mut self, parameters: ParameterMap) -> Self {
        self.parameters = parameters;
        self
    }

    /// Builder-style setter for the disabled flag.
    #[must_use]
    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_node_is_enabled_by_default() {
        let n = Node::new(NodeId::v4(), "http", "Fetch");
        assert!(!n.disabled);
        assert!(n.parameters.is_empty());
    }

    #[test]
    fn serde_roundtrip_uses_type_key() {
        let n = Node::new(NodeId::v4(), "http", "Fetch");
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["type"], "http");
        let back: Node = serde_json::from_value(json).unwrap();
        assert_eq!(back.node_type, "http");
    }
}
