//! Directed edges between workflow nodes.

use nebula_wf_core::{ConnectionId, NodeId};
use serde::{Deserialize, Serialize};

/// The reserved `sourceOutput` label marking an iteration edge.
///
/// A loop edge is treated as iteration, not recursion (`spec.md` §3): it is
/// the one case where an edge may point back to an ancestor or to the node
/// itself without violating acyclicity.
pub const LOOP_OUTPUT: &str = "loop";

/// The default / unlabeled output; equivalent to `None`.
pub const MAIN_OUTPUT: &str = "main";

/// A directed edge from one node's output to another node's input.
///
/// See `spec.md` §3 — `Connection`. Multiple outgoing connections from one
/// node are legal; routing among them is governed by `sourceOutput`
/// (§4.1 steps 11-14).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    /// Unique connection identifier.
    pub id: ConnectionId,
    /// The node this edge originates from.
    #[serde(rename = "sourceNodeId")]
    pub source_node_id: NodeId,
    /// The node this edge terminates at.
    #[serde(rename = "targetNodeId")]
    pub target_node_id: NodeId,
    /// Branch label. `None` and `Some("main")` are equivalent defaults;
    /// `Some("loop")` marks an iteration edge; any other string is a
    /// user-defined branch label.
    #[serde(default, rename = "sourceOutput")]
    pub source_output: Option<String>,
    /// Which named input slot on the target node this feeds, if the target
    /// distinguishes inputs. Opaque to the engine.
    #[serde(default, rename = "targetInput")]
    pub target_input: Option<String>,
}

impl Connection {
    /// Construct a default (main-branch) connection between two nodes.
    #[must_use]
    pub fn new(source: NodeId, target: NodeId) -> Self {
        Self {
            id: ConnectionId::v4(),
            source_node_id: source,
            target_node_id: target,
            source_output: None,
            target_input: None,
        }
    }

    /// Construct a connection carrying an explicit `sourceOutput` label.
    #[must_use]
    pub fn with_output(source: NodeId, target: NodeId, output: impl Into<String>) -> Self {
        Self {
            id: ConnectionId::v4(),
            source_node_id: source,
            target_node_id: target,
            source_output: Some(output.into()),
            target_input: None,
        }
    }

    /// `true` if this is a loop (iteration) edge.
    #[must_use]
    pub fn is_loop(&self) -> bool {
        self.source_output.as_deref() == Some(LOOP_OUTPUT)
    }

    /// `true` if this edge is eligible under the default (`None`/`"main"`)
    /// branch, i.e. it is not a user-defined branch and not a loop edge.
    #[must_use]
    pub fn is_main(&self) -> bool {
        matches!(self.source_output.as_deref(), None | Some(MAIN_OUTPUT))
    }

    /// Whether this edge is eligible given a selected branch label.
    ///
    /// Per `spec.md` §4.1 step 11: with `branch == None`, every connection
    /// is eligible; otherwise only connections whose `sourceOutput` is
    /// `None`, `"main"`, or exactly `branch` are eligible.
    #[must_use]
    pub fn eligible_for_branch(&self, branch: Option<&str>) -> bool {
        match branch {
            None => true,
            Some(b) => self.is_main() || self.source_output.as_deref() == Some(b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_connection_is_main() {
        let c = Connection::new(NodeId::v4(), NodeId::v4());
        assert!(c.is_main());
        assert!(!c.is_loop());
    }

    #[test]
    fn loop_output_detected() {
        let c = Connection::with_output(NodeId::v4(), NodeId::v4(), "loop");
        assert!(c.is_loop());
    }

    #[test]
    fn branch_eligibility_none_allows_all() {
        let c = Connection::with_output(NodeId::v4(), NodeId::v4(), "yes");
        assert!(c.eligible_for_branch(None));
    }

    #[test]
    fn branch_eligibility_matches_main_and_exact_label() {
        let main = Connection::new(NodeId::v4(), NodeId::v4());
        let yes = Connection::with_output(NodeId::v4(), NodeId::v4(), "yes");
        let no = Connection::with_output(NodeId::v4(), NodeId::v4(), "no");

        assert!(main.eligible_for_branch(Some("yes")));
        assert!(yes.eligible_for_branch(Some("yes")));
        assert!(!no.eligible_for_branch(Some("yes")));
    }
}
