//! The execution engine (C7): graph traversal with branch selection, loop
//! expansion, parallel/sequential fan-out, cancellation, and per-node error
//! handling (`spec.md` §4.1).

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use nebula_wf_core::{Clock, ExecutionId, NodeId, WorkflowId};
use nebula_wf_credential::CredentialStore;
use nebula_wf_execution::{Execution, ExecutionStatus, ExecutionStore, NodeExecution};
use nebula_wf_log::ExecutionLogger;
use nebula_wf_model::{Connection, TriggerType, Workflow, WorkflowStore, WorkflowValidationError};
use nebula_wf_node::{ExecutionContext, ExecutorRegistry, NodeExecutor};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::error::EngineError;
use crate::step_debug::{StepDebugRegistry, StepDebugSession};

/// Everything a single in-flight execution's node tasks need, bundled so it
/// can be cloned cheaply into spawned tasks (`spec.md` §5: parallel fan-out
/// submits N tasks to a shared pool; nothing here is borrowed).
#[derive(Clone)]
struct RunState {
    execution_id: ExecutionId,
    workflow: Arc<Workflow>,
    cancellation: nebula_wf_core::CancellationFlag,
    step_debug: Arc<StepDebugSession>,
    node_executions: Arc<Mutex<Vec<NodeExecution>>>,
    logger: Arc<ExecutionLogger>,
    registry: Arc<ExecutorRegistry>,
    credentials: Arc<dyn CredentialStore>,
    clock: Arc<dyn Clock>,
}

/// The execution engine.
///
/// Consumes the executor registry (C4), the execution logger (C3), the
/// step-debug registry (C5), and the credential store (C6) — `spec.md` §2.
pub struct WorkflowEngine {
    workflow_store: Arc<dyn WorkflowStore>,
    execution_store: Arc<dyn ExecutionStore>,
    credentials: Arc<dyn CredentialStore>,
    registry: Arc<ExecutorRegistry>,
    logger: Arc<ExecutionLogger>,
    clock: Arc<dyn Clock>,
    step_debug: Arc<StepDebugRegistry>,
    cancellations: DashMap<ExecutionId, (WorkflowId, nebula_wf_core::CancellationFlag)>,
}

impl WorkflowEngine {
    /// Assemble an engine from its collaborators.
    #[must_use]
    pub fn new(
        workflow_store: Arc<dyn WorkflowStore>,
        execution_store: Arc<dyn ExecutionStore>,
        credentials: Arc<dyn CredentialStore>,
        registry: Arc<ExecutorRegistry>,
        logger: Arc<ExecutionLogger>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            workflow_store,
            execution_store,
            credentials,
            registry,
            logger,
            clock,
            step_debug: Arc::new(StepDebugRegistry::new()),
            cancellations: DashMap::new(),
        }
    }

    /// The executor registry (C4), shared with the plugin loader (C11).
    #[must_use]
    pub fn registry(&self) -> &Arc<ExecutorRegistry> {
        &self.registry
    }

    /// The execution logger (C3).
    #[must_use]
    pub fn logger(&self) -> &Arc<ExecutionLogger> {
        &self.logger
    }

    /// The step-debug registry (C5), one session per live execution.
    #[must_use]
    pub fn step_debug(&self) -> &Arc<StepDebugRegistry> {
        &self.step_debug
    }

    /// Run a workflow to completion as triggered manually (C10): `Execute`
    /// with `triggerType = MANUAL`.
    pub async fn execute(&self, workflow_id: WorkflowId, input: Value) -> Result<Execution, EngineError> {
        self.submit(workflow_id, TriggerType::Manual, input).await
    }

    /// Run a workflow to completion under an explicit trigger type. Used
    /// internally by the cron (C8) and file-event (C9) triggers; manual
    /// calls go through [`WorkflowEngine::execute`].
    pub async fn submit(&self, workflow_id: WorkflowId, trigger_type: TriggerType, input: Value) -> Result<Execution, EngineError> {
        let workflow = self.workflow_store.find_by_id(workflow_id).await.map_err(|e| match e {
            nebula_wf_model::WorkflowStoreError::NotFound(id) => EngineError::WorkflowNotFound(id),
            other => EngineError::from(other),
        })?;
        workflow.validate().map_err(|e| match e {
            WorkflowValidationError::NoEntryNode => EngineError::NoTriggerNodes,
            other => EngineError::from(other),
        })?;
        let workflow = Arc::new(workflow);

        let mut exec = Execution::start(workflow_id, trigger_type, input.clone(), self.clock.now());
        let execution_id = exec.id;

        let cancellation = nebula_wf_core::CancellationFlag::new();
        self.cancellations.insert(execution_id, (workflow_id, cancellation.clone()));
        let step_debug = self.step_debug.start_session(execution_id);

        self.execution_store.save(exec.clone()).await;
        self.logger.start_execution(execution_id, workflow_id, &workflow.name);
        info!(%execution_id, %workflow_id, %trigger_type, "execution submitted");

        let node_executions = Arc::new(Mutex::new(Vec::new()));
        let state = RunState {
            execution_id,
            workflow: workflow.clone(),
            cancellation: cancellation.clone(),
            step_debug,
            node_executions: node_executions.clone(),
            logger: self.logger.clone(),
            registry: self.registry.clone(),
            credentials: self.credentials.clone(),
            clock: self.clock.clone(),
        };

        // Trigger nodes run sequentially in declaration order; the last
        // one's output becomes the workflow output (`spec.md` §4.1 step 7).
        let mut last_output = Value::Null;
        let mut run_error = None;
        for node in workflow.trigger_nodes() {
            match execute_node(state.clone(), node.id, input.clone()).await {
                Ok(output) => last_output = output,
                Err(e) => {
                    run_error = Some(e);
                    break;
                }
            }
        }

        let finished_at = self.clock.now();
        exec.node_executions = node_executions.lock().clone();
        self.finish_execution(&mut exec, finished_at, &cancellation, last_output, run_error)?;

        self.execution_store.save(exec.clone()).await;
        self.cancellations.remove(&execution_id);
        self.step_debug.end_session(execution_id);

        if exec.status == ExecutionStatus::Failed {
            warn!(%execution_id, error = exec.error_message.as_deref().unwrap_or(""), "execution failed");
        } else {
            info!(%execution_id, status = %exec.status, "execution finished");
        }

        Ok(exec)
    }

    /// Apply `spec.md` §4.1 step 9: decide the terminal status and persist
    /// it on `exec`, logging `EXECUTION_END` either way.
    fn finish_execution(
        &self,
        exec: &mut Execution,
        finished_at: DateTime<Utc>,
        cancellation: &nebula_wf_core::CancellationFlag,
        last_output: Value,
        run_error: Option<EngineError>,
    ) -> Result<(), EngineError> {
        match run_error {
            None => {
                let cancelled = cancellation.is_cancelled();
                let status = if cancelled { ExecutionStatus::Cancelled } else { ExecutionStatus::Success };
                let (output, error_message) = if cancelled {
                    (None, Some("Execution cancelled by user".to_string()))
                } else {
                    (Some(last_output), None)
                };
                exec.finish(status, finished_at, output.clone(), error_message)?;
                self.logger.end_execution(exec.id, !cancelled, output.as_ref());
            }
            Some(e) => {
                let cancelled = cancellation.is_cancelled() || e.is_cancellation();
                let status = if cancelled { ExecutionStatus::Cancelled } else { ExecutionStatus::Failed };
                let message = if cancelled { "Execution cancelled by user".to_string() } else { e.to_string() };
                self.logger.error_with_context(
                    exec.id,
                    None,
                    None,
                    None,
                    "ExecutionFailed",
                    &message,
                    None,
                    None,
                );
                exec.finish(status, finished_at, None, Some(message))?;
                self.logger.end_execution(exec.id, false, None);
            }
        }
        Ok(())
    }

    /// `ExecuteAsync` (`spec.md` §4.1): spawn the execution and return a
    /// handle to its eventual terminal [`Execution`].
    pub fn execute_async(self: &Arc<Self>, workflow_id: WorkflowId, input: Value) -> tokio::task::JoinHandle<Result<Execution, EngineError>> {
        let engine = self.clone();
        tokio::spawn(async move { engine.execute(workflow_id, input).await })
    }

    /// Signal cancellation for a running execution.
    ///
    /// Returns `true` iff the execution was found in the running table
    /// (i.e. it was RUNNING and the flag was actually set).
    #[must_use]
    pub fn cancel(&self, execution_id: ExecutionId) -> bool {
        match self.cancellations.get(&execution_id) {
            Some(entry) => {
                entry.value().1.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancel every execution currently running for `workflow_id`. Returns
    /// the number signaled.
    pub fn cancel_all_for_workflow(&self, workflow_id: WorkflowId) -> usize {
        let mut count = 0;
        for entry in self.cancellations.iter() {
            let (wf_id, flag) = entry.value();
            if *wf_id == workflow_id {
                flag.cancel();
                count += 1;
            }
        }
        count
    }

    /// Pass-through query: fetch one execution by id.
    pub async fn find_by_id(&self, id: ExecutionId) -> Result<Execution, nebula_wf_execution::ExecutionError> {
        self.execution_store.find_by_id(id).await
    }

    /// Pass-through query: every execution for a workflow, most recent
    /// first.
    pub async fn find_by_workflow_id(&self, workflow_id: WorkflowId) -> Vec<Execution> {
        self.execution_store.find_by_workflow_id_desc(workflow_id).await
    }

    /// Pass-through query: every currently-running execution.
    pub async fn find_running(&self) -> Vec<Execution> {
        self.execution_store.find_running().await
    }

    /// Pass-through query: executions started within `[from, to]`.
    pub async fn find_by_time_range(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Vec<Execution> {
        self.execution_store.find_by_time_range(from, to).await
    }
}

/// `spec.md` §4.1 "Algorithm — executeNode". Boxed to allow recursion
/// through an `async fn` and to be spawned into sibling tasks during
/// parallel fan-out (`tokio::spawn` requires a `'static` future).
fn execute_node(state: RunState, node_id: NodeId, input: Value) -> Pin<Box<dyn Future<Output = Result<Value, EngineError>> + Send>> {
    Box::pin(async move {
        // Step 1: cancellation is checked at every node boundary.
        let node = state
            .workflow
            .node(node_id)
            .expect("node_id originates from this workflow's own graph");

        if state.cancellation.is_cancelled() {
            return Err(EngineError::Cancelled { node_id: Some(node_id), node_type: Some(node.node_type.clone()) });
        }

        // Step 2: disabled nodes pass their input through unchanged and
        // still route to children — only the executor call is skipped.
        let output = if node.disabled {
            state.logger.node_skip(state.execution_id, node_id, &node.name, "node disabled");
            input.clone()
        } else {
            run_executor(&state, node_id, &node.node_type, &node.name, input.clone()).await?
        };

        // Step 8: re-check cancellation after the executor call.
        if state.cancellation.is_cancelled() {
            return Err(EngineError::Cancelled { node_id: Some(node_id), node_type: Some(node.node_type.clone()) });
        }

        // Step 9: the `_stopExecution` sentinel suppresses all traversal.
        if output.get("_stopExecution").and_then(Value::as_bool) == Some(true) {
            return Ok(output);
        }

        // Step 10: step-debug pause.
        if !state.step_debug.wait_for_step(node_id).await {
            return Err(EngineError::Cancelled { node_id: Some(node_id), node_type: Some(node.node_type.clone()) });
        }

        // Steps 11-12: branch filtering, then partition into loop/non-loop.
        let branch = output.get("branch").and_then(Value::as_str);
        let outgoing = state.workflow.outgoing(node_id);
        let eligible: Vec<&Connection> = outgoing.into_iter().filter(|c| c.eligible_for_branch(branch)).collect();
        let (loop_edges, fanout_edges): (Vec<&Connection>, Vec<&Connection>) = eligible.into_iter().partition(|c| c.is_loop());

        run_loop_edges(&state, &loop_edges, &output).await?;
        run_fanout_edges(&state, &fanout_edges, &output).await?;

        // Step 15: return this node's own output, never a child's.
        Ok(output)
    })
}

/// Steps 3-7: timing, logging, the executor call, and node-execution
/// bookkeeping for an enabled node.
async fn run_executor(state: &RunState, node_id: NodeId, node_type: &str, node_name: &str, input: Value) -> Result<Value, EngineError> {
    let node = state.workflow.node(node_id).expect("validated above");
    let started_at = state.clock.now();
    state.logger.node_start(state.execution_id, node_id, node_name);
    state.logger.node_input(state.execution_id, node_id, node_name, &input);

    let executor = state.registry.get(node_type).map_err(|_| EngineError::NoExecutor(node_type.to_string()))?;

    let ctx = ExecutionContext::new(
        state.execution_id,
        state.workflow.id,
        node.parameters.clone(),
        input,
        state.cancellation.clone(),
        state.logger.clone(),
        state.credentials.clone(),
        state.node_executions.clone(),
    );

    let result = executor.execute(node, ctx.input().clone(), &ctx).await;
    let finished_at = state.clock.now();

    match result {
        Ok(output) => {
            state.logger.node_output(state.execution_id, node_id, node_name, &output);
            state.logger.node_end(state.execution_id, node_id, node_name, true);
            state.node_executions.lock().push(NodeExecution::success(node_id, started_at, finished_at, output.clone()));
            Ok(output)
        }
        Err(e) => {
            state.logger.node_end(state.execution_id, node_id, node_name, false);
            state.logger.error_with_context(
                state.execution_id,
                Some(node_id),
                Some(node_name),
                Some(ctx.input()),
                "NodeExecutionFailed",
                &e.0,
                None,
                None,
            );
            state.node_executions.lock().push(NodeExecution::failed(node_id, started_at, finished_at, e.0.clone()));
            Err(EngineError::NodeExecutionFailed { node_id, node_type: node_type.to_string(), cause: e.0 })
        }
    }
}

/// Step 13: loop expansion. Edges execute in declaration order, serialized;
/// within one edge, iterations run in the source order of `results`.
async fn run_loop_edges(state: &RunState, loop_edges: &[&Connection], output: &Value) -> Result<(), EngineError> {
    if loop_edges.is_empty() {
        return Ok(());
    }
    let Some(results) = output.get("results").and_then(Value::as_array) else {
        return Ok(());
    };
    let base = output.as_object().cloned().unwrap_or_default();

    for edge in loop_edges {
        for element in results {
            let mut iteration = base.clone();
            if let Some(item) = element.get("item") {
                iteration.insert("item".to_string(), item.clone());
                if let Some(item_fields) = item.as_object() {
                    for (key, value) in item_fields {
                        iteration.insert(key.clone(), value.clone());
                    }
                }
            }
            if let Some(index) = element.get("index") {
                iteration.insert("index".to_string(), index.clone());
            }
            execute_node(state.clone(), edge.target_node_id, Value::Object(iteration)).await?;
        }
    }
    Ok(())
}

/// Step 14: non-loop fan-out. One edge runs sequentially; two or more run
/// concurrently, the engine awaiting all before propagating the first
/// error (`spec.md` §4.1, §5).
async fn run_fanout_edges(state: &RunState, edges: &[&Connection], output: &Value) -> Result<(), EngineError> {
    match edges.len() {
        0 => Ok(()),
        1 => execute_node(state.clone(), edges[0].target_node_id, output.clone()).await.map(|_| ()),
        _ => {
            let mut join_set = JoinSet::new();
            for edge in edges {
                let state = state.clone();
                let target = edge.target_node_id;
                let input = output.clone();
                join_set.spawn(async move { execute_node(state, target, input).await });
            }

            let mut first_error: Option<EngineError> = None;
            while let Some(joined) = join_set.join_next().await {
                match joined {
                    Ok(Ok(_)) => {}
                    Ok(Err(e)) if first_error.is_none() => first_error = Some(e),
                    Ok(Err(_)) => {}
                    Err(join_err) if first_error.is_none() => first_error = Some(EngineError::Interrupted(join_err.to_string())),
                    Err(_) => {}
                }
            }

            match first_error {
                Some(e) => Err(EngineError::ParallelExecutionFailed { cause: e.to_string() }),
                None => Ok(()),
            }
        }
    }
}
