//! The cron trigger (C8): one re-arming single-shot task per scheduled
//! workflow (`spec.md` §4.4.1).

use std::str::FromStr;
use std::sync::Arc;

use cron::Schedule;
use dashmap::DashMap;
use nebula_wf_core::{Clock, WorkflowId};
use nebula_wf_engine::WorkflowEngine;
use nebula_wf_model::{TriggerType, Workflow, WorkflowStore};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::error::TriggerError;

/// At most one pending task per workflow id (`spec.md` §4.4.1 "Guarantees").
pub struct CronTrigger {
    engine: Arc<WorkflowEngine>,
    clock: Arc<dyn Clock>,
    scheduled: DashMap<WorkflowId, JoinHandle<()>>,
}

impl CronTrigger {
    /// Build a trigger bound to `engine`, using `clock` for "now" when
    /// computing fire times — a [`nebula_wf_core::FixedClock`] makes
    /// scheduling deterministic in tests.
    #[must_use]
    pub fn new(engine: Arc<WorkflowEngine>, clock: Arc<dyn Clock>) -> Self {
        Self {
            engine,
            clock,
            scheduled: DashMap::new(),
        }
    }

    /// Enumerate every active, schedule-triggered workflow and register it.
    pub async fn start(self: &Arc<Self>, workflow_store: &dyn WorkflowStore) {
        for workflow in workflow_store.find_active_scheduled().await {
            if let Err(e) = self.register(&workflow) {
                warn!(workflow_id = %workflow.id, error = %e, "abandoning cron registration");
            }
        }
    }

    /// Parse `workflow.cron_expression`, cancel any prior schedule for this
    /// workflow, compute the next fire time, and spawn the re-arming task.
    pub fn register(self: &Arc<Self>, workflow: &Workflow) -> Result<(), TriggerError> {
        let expression = workflow
            .cron_expression
            .clone()
            .ok_or_else(|| TriggerError::InvalidCronExpression {
                expression: String::new(),
                reason: "workflow has no cronExpression".to_string(),
            })?;

        let schedule = Schedule::from_str(&expression).map_err(|e| TriggerError::InvalidCronExpression {
            expression: expression.clone(),
            reason: e.to_string(),
        })?;

        self.unregister(workflow.id);

        let this = self.clone();
        let workflow_id = workflow.id;
        let handle = tokio::spawn(async move {
            this.run_loop(workflow_id, schedule, expression).await;
        });
        self.scheduled.insert(workflow_id, handle);
        Ok(())
    }

    /// Cancel the pending task for `workflow_id`, if any. Does not
    /// interrupt a fire already in flight (`spec.md` §4.4.1).
    pub fn unregister(&self, workflow_id: WorkflowId) {
        if let Some((_, handle)) = self.scheduled.remove(&workflow_id) {
            handle.abort();
        }
    }

    /// `true` if a schedule is currently pending for `workflow_id`.
    #[must_use]
    pub fn is_registered(&self, workflow_id: WorkflowId) -> bool {
        self.scheduled.contains_key(&workflow_id)
    }

    async fn run_loop(&self, workflow_id: WorkflowId, schedule: Schedule, cron_expression: String) {
        loop {
            let now = self.clock.now();
            let Some(next) = schedule.after(&now).next() else {
                warn!(%workflow_id, "cron schedule has no further fire times, stopping");
                return;
            };
            let delay = (next - now).to_std().unwrap_or(std::time::Duration::ZERO);
            tokio::time::sleep(delay).await;

            let triggered_at = self.clock.now();
            let input = serde_json::json!({
                "triggeredAt": triggered_at,
                "triggerType": "schedule",
                "cronExpression": cron_expression,
            });

            info!(%workflow_id, %triggered_at, "cron fired");
            if let Err(e) = self.engine.submit(workflow_id, TriggerType::Schedule, input).await {
                warn!(%workflow_id, error = %e, "scheduled execution failed");
            }
            // Re-arm unconditionally: the next loop iteration recomputes the
            // fire time from the (possibly now-later) clock.
        }
    }
}
