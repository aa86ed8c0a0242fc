//! The `ExecutionStore` collaborator interface (`spec.md` §6).

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use async_trait::async_trait;
use nebula_wf_core::{ExecutionId, WorkflowId};
use parking_lot::RwLock;

use crate::error::ExecutionError;
use crate::execution::Execution;
use crate::status::ExecutionStatus;

/// Persists execution records.
///
/// The engine calls `save` at creation, at progress checkpoints, and at
/// each terminal transition (`spec.md` §6). The store — not the engine —
/// owns any `Workflow.version` bookkeeping (§9 Open Questions).
#[async_trait]
pub trait ExecutionStore: Send + Sync {
    /// Persist (insert or overwrite) an execution record.
    async fn save(&self, execution: Execution);

    /// Fetch a single execution by id.
    async fn find_by_id(&self, id: ExecutionId) -> Result<Execution, ExecutionError>;

    /// Fetch all executions for a workflow, most recent first.
    async fn find_by_workflow_id_desc(&self, workflow_id: WorkflowId) -> Vec<Execution>;

    /// Fetch every execution currently in a non-terminal status.
    async fn find_running(&self) -> Vec<Execution>;

    /// Fetch every execution started within `[from, to]`.
    async fn find_by_time_range(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Vec<Execution>;

    /// Delete every execution record. Intended for test/reset use.
    async fn delete_all(&self);
}

/// Simple in-memory `ExecutionStore`.
#[derive(Default)]
pub struct InMemoryExecutionStore {
    executions: RwLock<HashMap<ExecutionId, Execution>>,
}

impl InMemoryExecutionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ExecutionStore for InMemoryExecutionStore {
    async fn save(&self, execution: Execution) {
        self.executions.write().insert(execution.id, execution);
    }

    async fn find_by_id(&self, id: ExecutionId) -> Result<Execution, ExecutionError> {
        self.executions
            .read()
            .get(&id)
            .cloned()
            .ok_or(ExecutionError::NotFound(id))
    }

    async fn find_by_workflow_id_desc(&self, workflow_id: WorkflowId) -> Vec<Execution> {
        let mut found: Vec<Execution> = self
            .executions
            .read()
            .values()
            .filter(|e| e.workflow_id == workflow_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        found
    }

    async fn find_running(&self) -> Vec<Execution> {
        self.executions
            .read()
            .values()
            .filter(|e| !e.status.is_terminal())
            .cloned()
            .collect()
    }

    async fn find_by_time_range(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Vec<Execution> {
        self.executions
            .read()
            .values()
            .filter(|e| e.started_at >= from && e.started_at <= to)
            .cloned()
            .collect()
    }

    async fn delete_all(&self) {
        self.executions.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nebula_wf_model::TriggerType;
    use serde_json::Value;

    #[tokio::test]
    async fn save_and_find_by_id() {
        let store = InMemoryExecutionStore::new();
        let exec = Execution::start(WorkflowId::v4(), TriggerType::Manual, Value::Null, Utc::now());
        let id = exec.id;
        store.save(exec).await;
        let found = store.find_by_id(id).await.unwrap();
        assert_eq!(found.id, id);
    }

    #[tokio::test]
    async fn round_trip_through_the_store_preserves_every_field() {
        let store = InMemoryExecutionStore::new();
        let mut exec = Execution::start(WorkflowId::v4(), TriggerType::Schedule, serde_json::json!({"a": 1}), Utc::now());
        exec.finish(ExecutionStatus::Success, Utc::now(), Some(serde_json::json!({"b": 2})), None).unwrap();
        let id = exec.id;

        let before = serde_json::to_value(&exec).unwrap();
        store.save(exec).await;
        let found = store.find_by_id(id).await.unwrap();
        let after = serde_json::to_value(&found).unwrap();

        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn find_running_excludes_terminal() {
        let store = InMemoryExecutionStore::new();
        let wf = WorkflowId::v4();
        let mut running = Execution::start(wf, TriggerType::Manual, Value::Null, Utc::now());
        let mut done = Execution::start(wf, TriggerType::Manual, Value::Null, Utc::now());
        done.finish(ExecutionStatus::Success, Utc::now(), None, None).unwrap();

        store.save(running.clone()).await;
        store.save(done).await;

        let found = store.find_running().await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, running.id);

        running.finish(ExecutionStatus::Cancelled, Utc::now(), None, None).unwrap();
        store.save(running).await;
        assert!(store.find_running().await.is_empty());
    }

    #[tokio::test]
    async fn find_by_workflow_id_desc_orders_newest_first() {
        let store = InMemoryExecutionStore::new();
        let wf = WorkflowId::v4();
        let older = Execution::start(wf, TriggerType::Manual, Value::Null, Utc::now() - chrono::Duration::seconds(10));
        let newer = Execution::start(wf, TriggerType::Manual, Value::Null, Utc::now());
        store.save(older.clone()).await;
        store.save(newer.clone()).await;

        let found = store.find_by_workflow_id_desc(wf).await;
        assert_eq!(found[0].id, newer.id);
        assert_eq!(found[1].id, older.id);
    }
}
