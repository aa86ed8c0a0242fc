//! The executor-facing execution context (`spec.md` §6), handed to every
//! [`crate::executor::NodeExecutor::execute`] call.

use std::sync::Arc;

use nebula_wf_credential::{CredentialError, CredentialStore};
use nebula_wf_core::{CancellationFlag, ExecutionId, WorkflowId};
use nebula_wf_execution::NodeExecution;
use nebula_wf_log::ExecutionLogger;
use nebula_wf_model::ParameterMap;
use parking_lot::Mutex;
use serde_json::Value;

/// Read-only workflow/input plus append-only node-execution history, shared
/// across a single execution's node tasks.
///
/// `node_executions` is append-only because parallel fan-out appends from
/// sibling tasks (`spec.md` §5 "Locking discipline") — guarded by a
/// `parking_lot::Mutex` rather than exposed as a lock-free structure, since
/// appends are infrequent relative to node execution time.
pub struct ExecutionContext {
    execution_id: ExecutionId,
    workflow_id: WorkflowId,
    node_settings: ParameterMap,
    input: Value,
    cancellation: CancellationFlag,
    logger: Arc<ExecutionLogger>,
    credentials: Arc<dyn CredentialStore>,
    node_executions: Arc<Mutex<Vec<NodeExecution>>>,
}

impl ExecutionContext {
    /// Construct a context for one node invocation.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        execution_id: ExecutionId,
        workflow_id: WorkflowId,
        node_settings: ParameterMap,
        input: Value,
        cancellation: CancellationFlag,
        logger: Arc<ExecutionLogger>,
        credentials: Arc<dyn CredentialStore>,
        node_executions: Arc<Mutex<Vec<NodeExecution>>>,
    ) -> Self {
        Self {
            execution_id,
            workflow_id,
            node_settings,
            input,
            cancellation,
            logger,
            credentials,
            node_executions,
        }
    }

    /// The execution this node invocation belongs to.
    #[must_use]
    pub fn execution_id(&self) -> ExecutionId {
        self.execution_id
    }

    /// The workflow this execution is running.
    #[must_use]
    pub fn workflow_id(&self) -> WorkflowId {
        self.workflow_id
    }

    /// The invoked node's `parameters`.
    #[must_use]
    pub fn node_settings(&self) -> &ParameterMap {
        &self.node_settings
    }

    /// The input map routed from upstream (or the workflow input, for
    /// trigger nodes).
    #[must_use]
    pub fn input(&self) -> &Value {
        &self.input
    }

    /// `true` if the owning execution has been cancelled.
    ///
    /// Executors SHOULD poll this during long-running work to cooperate
    /// with cancellation.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// The shared execution logger.
    #[must_use]
    pub fn logger(&self) -> &Arc<ExecutionLogger> {
        &self.logger
    }

    /// Decrypt a credential by its opaque id.
    pub async fn decrypted_credential(&self, id: &str) -> Result<String, CredentialError> {
        self.credentials.decrypted_by_id(id).await
    }

    /// Look up a credential by name, then decrypt it.
    pub async fn decrypted_credential_by_name(&self, name: &str) -> Result<Option<String>, CredentialError> {
        match self.credentials.find_by_name(name).await? {
            Some(info) => Ok(Some(self.credentials.decrypted_by_id(&info.id).await?)),
            None => Ok(None),
        }
    }

    /// Append a node-execution record to the shared, execution-scoped
    /// history.
    pub fn record_node_execution(&self, record: NodeExecution) {
        self.node_executions.lock().push(record);
    }

    /// Snapshot every node-execution record appended so far, in append
    /// order.
    #[must_use]
    pub fn node_executions(&self) -> Vec<NodeExecution> {
        self.node_executions.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nebula_wf_core::{NodeId, SystemClock};
    use nebula_wf_credential::InMemoryCredentialStore;

    fn ctx() -> ExecutionContext {
        ExecutionContext::new(
            ExecutionId::v4(),
            WorkflowId::v4(),
            ParameterMap::new(),
            serde_json::json!({"x": 1}),
            CancellationFlag::new(),
            Arc::new(ExecutionLogger::new(Arc::new(SystemClock))),
            Arc::new(InMemoryCredentialStore::new()),
            Arc::new(Mutex::new(Vec::new())),
        )
    }

    #[test]
    fn exposes_input_and_settings() {
        let c = ctx();
        assert_eq!(c.input()["x"], 1);
        assert!(c.node_settings().is_empty());
        assert!(!c.is_cancelled());
    }

    #[test]
    fn record_node_execution_is_visible_via_snapshot() {
        let c = ctx();
        let now = chrono::Utc::now();
        c.record_node_execution(NodeExecution::success(NodeId::v4(), now, now, serde_json::json!({})));
        assert_eq!(c.node_executions().len(), 1);
    }

    #[tokio::test]
    async fn decrypted_credential_by_name_resolves_through_store() {
        let credentials = Arc::new(InMemoryCredentialStore::new());
        credentials.insert("cred-1", "github", "s3cr3t");
        let c = ExecutionContext::new(
            ExecutionId::v4(),
            WorkflowId::v4(),
            ParameterMap::new(),
            Value::Null,
            CancellationFlag::new(),
            Arc::new(ExecutionLogger::new(Arc::new(SystemClock))),
            credentials,
            Arc::new(Mutex::new(Vec::new())),
        );
        let secret = c.decrypted_credential_by_name("github").await.unwrap();
        assert_eq!(secret.as_deref(), Some("s3cr3t"));
    }
}
