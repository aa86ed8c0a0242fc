//! The `WorkflowStore` collaborator interface (`spec.md` §6).
//!
//! The engine only ever reads through this trait; nothing in this
//! workspace mutates a workflow via the store. An in-memory reference
//! implementation is provided for tests and small deployments, mirroring
//! how the teacher's test modules stub out collaborators
//! (`crates/engine/src/engine.rs` builds its `ActionRegistry` directly
//! rather than depending on a database in unit tests).

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use nebula_wf_core::WorkflowId;

use crate::error::WorkflowStoreError;
use crate::workflow::{TriggerType, Workflow};

/// Read-only access to workflow definitions.
///
/// Implementations MUST be safe to share behind `Arc` and called
/// concurrently from triggers and the engine.
#[async_trait]
pub trait WorkflowStore: Send + Sync {
    /// Fetch a single workflow by id.
    async fn find_by_id(&self, id: WorkflowId) -> Result<Workflow, WorkflowStoreError>;

    /// Fetch every known workflow.
    async fn find_all(&self) -> Vec<Workflow>;

    /// Fetch every workflow with the given trigger type.
    async fn find_by_trigger_type(&self, trigger_type: TriggerType) -> Vec<Workflow>;

    /// Fetch every `active` workflow with `trigger_type == Schedule` and a
    /// non-empty `cron_expression` — exactly the set the cron trigger (C8)
    /// enumerates at startup.
    async fn find_active_scheduled(&self) -> Vec<Workflow> {
        self.find_by_trigger_type(TriggerType::Schedule)
            .await
            .into_iter()
            .filter(|w| w.active && w.cron_expression.is_some())
            .collect()
    }
}

/// Simple in-memory `WorkflowStore` backed by a `RwLock<HashMap>`.
#[derive(Default)]
pub struct InMemoryWorkflowStore {
    workflows: RwLock<HashMap<WorkflowId, Workflow>>,
}

impl InMemoryWorkflowStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a workflow.
    pub fn upsert(&self, workflow: Workflow) {
        self.workflows.write().unwrap().insert(workflow.id, workflow);
    }

    /// Remove a workflow by id.
    pub fn remove(&self, id: WorkflowId) {
        self.workflows.write().unwrap().remove(&id);
    }
}

#[async_trait]
impl WorkflowStore for InMemoryWorkflowStore {
    async fn find_by_id(&self, id: WorkflowId) -> Result<Workflow, WorkflowStoreError> {
        self.workflows
            .read()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(WorkflowStoreError::NotFound(id))
    }

    async fn find_all(&self) -> Vec<Workflow> {
        self.workflows.read().unwrap().values().cloned().collect()
    }

    async fn find_by_trigger_type(&self, trigger_type: TriggerType) -> Vec<Workflow> {
        self.workflows
            .read()
            .unwrap()
            .values()
            .filter(|w| w.trigger_type == trigger_type)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;
    use nebula_wf_core::NodeId;

    #[tokio::test]
    async fn find_by_id_missing_errors() {
        let store = InMemoryWorkflowStore::new();
        let id = WorkflowId::v4();
        let err = store.find_by_id(id).await.unwrap_err();
        assert_eq!(err, WorkflowStoreError::NotFound(id));
    }

    #[tokio::test]
    async fn upsert_then_find() {
        let store = InMemoryWorkflowStore::new();
        let w = Workflow::new(WorkflowId::v4(), "w", vec![Node::new(NodeId::v4(), "echo", "A")]);
        let id = w.id;
        store.upsert(w);
        let found = store.find_by_id(id).await.unwrap();
        assert_eq!(found.id, id);
    }

    #[tokio::test]
    async fn find_active_scheduled_filters_correctly() {
        let store = InMemoryWorkflowStore::new();
        let active = Workflow::new(WorkflowId::v4(), "active", vec![])
            .with_trigger(TriggerType::Schedule)
            .with_active(true);
        let mut active = active;
        active.cron_expression = Some("*/5 * * * *".into());

        let inactive = Workflow::new(WorkflowId::v4(), "inactive", vec![])
            .with_trigger(TriggerType::Schedule)
            .with_active(false);

        store.upsert(active.clone());
        store.upsert(inactive);

        let found = store.find_active_scheduled().await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, active.id);
    }
}
