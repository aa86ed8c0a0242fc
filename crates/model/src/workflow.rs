//! Workflow graph: nodes, connections, trigger descriptor, and
//! well-formedness validation.

use std::collections::{HashMap, HashSet};

use nebula_wf_core::{NodeId, WorkflowId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::connection::Connection;
use crate::error::WorkflowValidationError;
use crate::node::{Node, ParameterMap};

/// The source that can submit an execution of a workflow.
///
/// See `spec.md` §3. `WEBHOOK` is modeled as a distinct trigger type but —
/// per §1 Non-goals ("no node-type semantics") — no webhook *trigger source*
/// is implemented in this workspace; only the type tag round-trips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerType {
    /// Started directly via the manual trigger API (C10).
    Manual,
    /// Started by the cron trigger (C8).
    Schedule,
    /// Started by the file-event trigger (C9).
    FileEvent,
    /// Reserved; no in-process trigger source implemented.
    Webhook,
}

impl std::fmt::Display for TriggerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Manual => "manual",
            Self::Schedule => "schedule",
            Self::FileEvent => "file_event",
            Self::Webhook => "webhook",
        };
        write!(f, "{s}")
    }
}

/// A declarative workflow: a graph of nodes plus a trigger descriptor.
///
/// See `spec.md` §3 — `Workflow`. This is a read-only snapshot as handed to
/// the engine by a [`crate::store::WorkflowStore`]; the engine never mutates
/// it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    /// Unique workflow identifier.
    pub id: WorkflowId,
    /// Human-readable name.
    pub name: String,
    /// The node set.
    pub nodes: Vec<Node>,
    /// The edge set.
    pub connections: Vec<Connection>,
    /// Opaque, workflow-level settings (e.g. timezone, error-handling mode).
    #[serde(default)]
    pub settings: ParameterMap,
    /// Which trigger source starts this workflow.
    #[serde(rename = "triggerType")]
    pub trigger_type: TriggerType,
    /// Required when `trigger_type == Schedule`.
    #[serde(default, rename = "cronExpression")]
    pub cron_expression: Option<String>,
    /// Whether this workflow's trigger should be (re-)registered.
    #[serde(default)]
    pub active: bool,
    /// Monotonically increasing revision, owned entirely by the store — the
    /// engine reads it but never increments it (`spec.md` §9 Open Questions).
    #[serde(default)]
    pub version: u64,
}

impl Workflow {
    /// Construct a minimal manual workflow for tests and programmatic use.
    #[must_use]
    pub fn new(id: WorkflowId, name: impl Into<String>, nodes: Vec<Node>) -> Self {
        Self {
            id,
            name: name.into(),
            nodes,
            connections: Vec::new(),
            settings: ParameterMap::new(),
            trigger_type: TriggerType::Manual,
            cron_expression: None,
            active: false,
            version: 1,
        }
    }

    /// Builder-style setter for connections.
    #[must_use]
    pub fn with_connections(mut self, connections: Vec<Connection>) -> Self {
        self.connections = connections;
        self
    }

    /// Builder-style setter for trigger type.
    #[must_use]
    pub fn with_trigger(mut self, trigger_type: TriggerType) -> Self {
        self.trigger_type = trigger_type;
        self
    }

    /// Builder-style setter for the active flag.
    #[must_use]
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Look up a node by id.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// All connections whose source is `node_id`, in declaration order.
    #[must_use]
    pub fn outgoing(&self, node_id: NodeId) -> Vec<&Connection> {
        self.connections
            .iter()
            .filter(|c| c.source_node_id == node_id)
            .collect()
    }

    /// All connections whose target is `node_id`.
    #[must_use]
    pub fn incoming(&self, node_id: NodeId) -> Vec<&Connection> {
        self.connections
            .iter()
            .filter(|c| c.target_node_id == node_id)
            .collect()
    }

    /// Trigger nodes: nodes with no incoming connections at all
    /// (`spec.md` §4.1 step 6), in declaration order.
    #[must_use]
    pub fn trigger_nodes(&self) -> Vec<&Node> {
        let has_incoming: HashSet<NodeId> =
            self.connections.iter().map(|c| c.target_node_id).collect();
        self.nodes
            .iter()
            .filter(|n| !has_incoming.contains(&n.id))
            .collect()
    }

    /// Validate well-formedness per `spec.md` §3:
    /// (a) node ids are unique,
    /// (b) every connection references existing nodes,
    /// (c) at least one entry node exists,
    /// and the graph is acyclic along non-loop edges.
    pub fn validate(&self) -> Result<(), WorkflowValidationError> {
        let mut seen = HashSet::with_capacity(self.nodes.len());
        for node in &self.nodes {
            if !seen.insert(node.id) {
                return Err(WorkflowValidationError::DuplicateNodeId(node.id));
            }
        }

        let node_ids: HashSet<NodeId> = self.nodes.iter().map(|n| n.id).collect();
        for conn in &self.connections {
            if !node_ids.contains(&conn.source_node_id) {
                return Err(WorkflowValidationError::DanglingConnection(
                    conn.id,
                    conn.source_node_id,
                ));
            }
            if !node_ids.contains(&conn.target_node_id) {
                return Err(WorkflowValidationError::DanglingConnection(
                    conn.id,
                    conn.target_node_id,
                ));
            }
        }

        if self.trigger_nodes().is_empty() && !self.nodes.is_empty() {
            return Err(WorkflowValidationError::NoEntryNode);
        }

        detect_cycle(self)
    }
}

/// Depth-first cycle detection over non-loop edges only.
///
/// A single `loop` edge from a node to itself or an ancestor is iteration,
/// not recursion, and is explicitly permitted (`spec.md` §3).
fn detect_cycle(workflow: &Workflow) -> Result<(), WorkflowValidationError> {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Mark {
        Visiting,
        Done,
    }

    let mut marks: HashMap<NodeId, Mark> = HashMap::new();

    fn visit(
        workflow: &Workflow,
        node_id: NodeId,
        marks: &mut HashMap<NodeId, Mark>,
    ) -> Result<(), WorkflowValidationError> {
        match marks.get(&node_id) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::Visiting) => return Err(WorkflowValidationError::CycleDetected(node_id)),
            None => {}
        }
        marks.insert(node_id, Mark::Visiting);
        for conn in workflow.outgoing(node_id) {
            if conn.is_loop() {
                continue;
            }
            visit(workflow, conn.target_node_id, marks)?;
        }
        marks.insert(node_id, Mark::Done);
        Ok(())
    }

    for node in &workflow.nodes {
        visit(workflow, node.id, &mut marks)?;
    }
    Ok(())
}

/// Arbitrary trigger/manual input payload, serialized verbatim into the
/// execution record (`spec.md` §4.1 "Inputs").
pub type WorkflowInput = Value;

#[cfg(test)]
mod tests {
    use super::*;

    fn wf(nodes: Vec<Node>, connections: Vec<Connection>) -> Workflow {
        Workflow::new(WorkflowId::v4(), "test", nodes).with_connections(connections)
    }

    #[test]
    fn single_node_is_trigger_node() {
        let n = Node::new(NodeId::v4(), "echo", "A");
        let w = wf(vec![n.clone()], vec![]);
        assert_eq!(w.trigger_nodes().len(), 1);
        assert!(w.validate().is_ok());
    }

    #[test]
    fn duplicate_node_ids_rejected() {
        let id = NodeId::v4();
        let a = Node::new(id, "echo", "A");
        let b = Node::new(id, "echo", "B");
        let w = wf(vec![a, b], vec![]);
        assert!(matches!(
            w.validate(),
            Err(WorkflowValidationError::DuplicateNodeId(_))
        ));
    }

    #[test]
    fn dangling_connection_rejected() {
        let a = Node::new(NodeId::v4(), "echo", "A");
        let missing = NodeId::v4();
        let w = wf(vec![a.clone()], vec![Connection::new(a.id, missing)]);
        assert!(matches!(
            w.validate(),
            Err(WorkflowValidationError::DanglingConnection(_, _))
        ));
    }

    #[test]
    fn no_entry_node_rejected() {
        let a = Node::new(NodeId::v4(), "echo", "A");
        let b = Node::new(NodeId::v4(), "echo", "B");
        // a -> b -> a: every node has an incoming connection.
        let w = wf(
            vec![a.clone(), b.clone()],
            vec![Connection::new(a.id, b.id), Connection::new(b.id, a.id)],
        );
        assert!(matches!(
            w.validate(),
            Err(WorkflowValidationError::NoEntryNode)
        ));
    }

    #[test]
    fn cycle_on_non_loop_edges_rejected() {
        let a = Node::new(NodeId::v4(), "echo", "A");
        let b = Node::new(NodeId::v4(), "echo", "B");
        let c = Node::new(NodeId::v4(), "echo", "C");
        // a -> b -> c -> b forms a cycle not reachable via loop label, but a
        // is still an entry node so this exercises acyclicity specifically.
        let w = wf(
            vec![a.clone(), b.clone(), c.clone()],
            vec![
                Connection::new(a.id, b.id),
                Connection::new(b.id, c.id),
                Connection::new(c.id, b.id),
            ],
        );
        assert!(matches!(
            w.validate(),
            Err(WorkflowValidationError::CycleDetected(_))
        ));
    }

    #[test]
    fn self_loop_edge_is_permitted() {
        let a = Node::new(NodeId::v4(), "echo", "A");
        let b = Node::new(NodeId::v4(), "echo", "B");
        let w = wf(
            vec![a.clone(), b.clone()],
            vec![
                Connection::new(a.id, b.id),
                Connection::with_output(b.id, b.id, "loop"),
            ],
        );
        assert!(w.validate().is_ok());
    }

    #[test]
    fn loop_edge_back_to_ancestor_is_permitted() {
        let a = Node::new(NodeId::v4(), "echo", "A");
        let b = Node::new(NodeId::v4(), "echo", "B");
        let w = wf(
            vec![a.clone(), b.clone()],
            vec![
                Connection::new(a.id, b.id),
                Connection::with_output(b.id, a.id, "loop"),
            ],
        );
        assert!(w.validate().is_ok());
    }
}
