//! The manual trigger (C10).
//!
//! `spec.md` §4.4.3: "Direct `Execute`/`ExecuteAsync` on the engine, with
//! `triggerType = MANUAL`." [`nebula_wf_engine::WorkflowEngine::execute`]
//! already implements this directly; this wrapper exists only so the
//! trigger subsystem has one type per source, matching how cron (C8) and
//! file-event (C9) are exposed.

use std::sync::Arc;

use nebula_wf_engine::{EngineError, WorkflowEngine};
use nebula_wf_execution::Execution;
use nebula_wf_core::WorkflowId;
use serde_json::Value;

/// Thin facade over [`WorkflowEngine::execute`] for API symmetry with the
/// other trigger sources.
pub struct ManualTrigger {
    engine: Arc<WorkflowEngine>,
}

impl ManualTrigger {
    #[must_use]
    pub fn new(engine: Arc<WorkflowEngine>) -> Self {
        Self { engine }
    }

    /// Run `workflow_id` to completion with `input`, synchronously.
    pub async fn fire(&self, workflow_id: WorkflowId, input: Value) -> Result<Execution, EngineError> {
        self.engine.execute(workflow_id, input).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use nebula_wf_core::{Clock, NodeId, SystemClock};
    use nebula_wf_credential::InMemoryCredentialStore;
    use nebula_wf_execution::{ExecutionStatus, InMemoryExecutionStore};
    use nebula_wf_log::ExecutionLogger;
    use nebula_wf_model::{InMemoryWorkflowStore, Node, TriggerType, Workflow, WorkflowStore};
    use nebula_wf_node::{ExecutionContext, ExecutorError, ExecutorRegistry, NodeExecutor};
    use serde_json::json;

    struct Echo;

    #[async_trait]
    impl NodeExecutor for Echo {
        fn node_type(&self) -> &str {
            "echo"
        }

        async fn execute(&self, _node: &Node, input: Value, _ctx: &ExecutionContext) -> Result<Value, ExecutorError> {
            Ok(input)
        }
    }

    #[tokio::test]
    async fn manual_trigger_reports_trigger_type_manual() {
        let workflow_store = Arc::new(InMemoryWorkflowStore::new());
        let workflow = Workflow::new(
            WorkflowId::v4(),
            "manual",
            vec![Node::new(NodeId::v4(), "echo", "A")],
        )
        .with_trigger(TriggerType::Manual);
        let workflow_id = workflow.id;
        workflow_store.upsert(workflow);

        let registry = Arc::new(ExecutorRegistry::new());
        registry.register(Arc::new(Echo)).unwrap();

        let clock = Arc::new(SystemClock) as Arc<dyn Clock>;
        let engine = Arc::new(WorkflowEngine::new(
            workflow_store,
            Arc::new(InMemoryExecutionStore::new()),
            Arc::new(InMemoryCredentialStore::new()),
            registry,
            Arc::new(ExecutionLogger::new(clock.clone())),
            clock,
        ));

        let trigger = ManualTrigger::new(engine);
        let exec = trigger.fire(workflow_id, json!({"x": 1})).await.unwrap();
        assert_eq!(exec.trigger_type, TriggerType::Manual);
        assert_eq!(exec.status, ExecutionStatus::Success);
    }
}
