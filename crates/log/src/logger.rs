//! The execution logger (C3): structured, category-tagged, in-memory log
//! store with fan-out to pluggable sinks.

use std::sync::Arc;

use dashmap::DashMap;
use nebula_wf_core::{Clock, ExecutionId, LogEntryId, NodeId};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;

use crate::category::LogCategory;
use crate::entry::{preview, truncate, LogContext, LogEntry};
use crate::level::LogLevel;
use crate::sink::LogSink;
use crate::summary::ExecutionLogSummary;

const PREVIEW_CHARS: usize = 100;
const EXPRESSION_CHARS: usize = 200;

/// Maintains per-execution log buffers, assigns entry ids, fans out to
/// sinks, and computes summaries.
///
/// Buffers are retained in memory until [`ExecutionLogger::clear`] or
/// [`ExecutionLogger::clear_all`] (`spec.md` §4.3 "Memory policy"). An
/// optional per-execution entry cap evicts the oldest entries once
/// exceeded, matching the spec's "implementations MAY cap" allowance.
pub struct ExecutionLogger {
    clock: Arc<dyn Clock>,
    buffers: DashMap<ExecutionId, Mutex<Vec<LogEntry>>>,
    sinks: RwLock<Vec<Arc<dyn LogSink>>>,
    max_entries_per_execution: Option<usize>,
}

impl ExecutionLogger {
    /// Create a logger with no entry cap.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            buffers: DashMap::new(),
            sinks: RwLock::new(Vec::new()),
            max_entries_per_execution: None,
        }
    }

    /// Create a logger that evicts the oldest entries once an execution's
    /// buffer exceeds `max_entries`.
    #[must_use]
    pub fn with_capacity(clock: Arc<dyn Clock>, max_entries: usize) -> Self {
        Self {
            clock,
            buffers: DashMap::new(),
            sinks: RwLock::new(Vec::new()),
            max_entries_per_execution: Some(max_entries),
        }
    }

    /// Register a sink to receive every future entry across all
    /// executions.
    pub fn add_sink(&self, sink: Arc<dyn LogSink>) {
        self.sinks.write().push(sink);
    }

    /// Unregister a previously-added sink (identity comparison).
    pub fn remove_sink(&self, sink: &Arc<dyn LogSink>) {
        self.sinks
            .write()
            .retain(|s| !Arc::ptr_eq(s, sink));
    }

    fn emit(
        &self,
        execution_id: ExecutionId,
        level: LogLevel,
        category: LogCategory,
        message: impl Into<String>,
        context: LogContext,
    ) {
        let entry = LogEntry {
            id: LogEntryId::v4(),
            execution_id,
            timestamp: self.clock.now(),
            level,
            category,
            message: message.into(),
            context,
        };

        {
            let buffer = self
                .buffers
                .entry(execution_id)
                .or_insert_with(|| Mutex::new(Vec::new()));
            let mut guard = buffer.lock();
            guard.push(entry.clone());
            if let Some(cap) = self.max_entries_per_execution {
                while guard.len() > cap {
                    guard.remove(0);
                }
            }
        }

        for sink in self.sinks.read().iter() {
            // Sink failures are swallowed (`spec.md` §4.3) — a panicking
            // sink must never affect execution.
            let sink = sink.clone();
            let entry_ref = &entry;
            let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                sink.handle(entry_ref);
            }));
        }
    }

    /// `EXECUTION_START` — initialize a buffer and emit a start entry.
    pub fn start_execution(
        &self,
        execution_id: ExecutionId,
        workflow_id: impl std::fmt::Display,
        workflow_name: &str,
    ) {
        self.buffers
            .entry(execution_id)
            .or_insert_with(|| Mutex::new(Vec::new()));
        let mut ctx = LogContext::new();
        ctx.insert("workflowId".into(), Value::String(workflow_id.to_string()));
        ctx.insert("workflowName".into(), Value::String(workflow_name.to_string()));
        self.emit(
            execution_id,
            LogLevel::Info,
            LogCategory::ExecutionStart,
            format!("execution started for workflow '{workflow_name}'"),
            ctx,
        );
    }

    /// `EXECUTION_END`.
    pub fn end_execution(&self, execution_id: ExecutionId, success: bool, result: Option<&Value>) {
        let mut ctx = LogContext::new();
        ctx.insert("success".into(), Value::Bool(success));
        if let Some(result) = result {
            ctx.insert("resultPreview".into(), Value::String(preview(result, PREVIEW_CHARS)));
        }
        self.emit(
            execution_id,
            if success { LogLevel::Info } else { LogLevel::Error },
            LogCategory::ExecutionEnd,
            format!("execution ended, success={success}"),
            ctx,
        );
    }

    fn node_context(node_id: NodeId, node_name: &str) -> LogContext {
        let mut ctx = LogContext::new();
        ctx.insert("nodeId".into(), Value::String(node_id.to_string()));
        ctx.insert("nodeName".into(), Value::String(node_name.to_string()));
        ctx
    }

    /// `NODE_START`.
    pub fn node_start(&self, execution_id: ExecutionId, node_id: NodeId, node_name: &str) {
        self.emit(
            execution_id,
            LogLevel::Debug,
            LogCategory::NodeStart,
            format!("node '{node_name}' started"),
            Self::node_context(node_id, node_name),
        );
    }

    /// `NODE_END`.
    pub fn node_end(&self, execution_id: ExecutionId, node_id: NodeId, node_name: &str, success: bool) {
        let mut ctx = Self::node_context(node_id, node_name);
        ctx.insert("success".into(), Value::Bool(success));
        self.emit(
            execution_id,
            if success { LogLevel::Debug } else { LogLevel::Warn },
            LogCategory::NodeEnd,
            format!("node '{node_name}' ended, success={success}"),
            ctx,
        );
    }

    /// `NODE_SKIP`.
    pub fn node_skip(&self, execution_id: ExecutionId, node_id: NodeId, node_name: &str, reason: &str) {
        let mut ctx = Self::node_context(node_id, node_name);
        ctx.insert("reason".into(), Value::String(reason.to_string()));
        self.emit(
            execution_id,
            LogLevel::Info,
            LogCategory::NodeSkip,
            format!("node '{node_name}' skipped: {reason}"),
            ctx,
        );
    }

    /// `NODE_INPUT` — carries both a truncated preview and the full
    /// deep-copied map under `*DataFull` (`spec.md` §4.3).
    pub fn node_input(&self, execution_id: ExecutionId, node_id: NodeId, node_name: &str, input: &Value) {
        let mut ctx = Self::node_context(node_id, node_name);
        ctx.insert("inputPreview".into(), Value::String(preview(input, PREVIEW_CHARS)));
        ctx.insert("inputDataFull".into(), input.clone());
        self.emit(
            execution_id,
            LogLevel::Trace,
            LogCategory::NodeInput,
            format!("node '{node_name}' input recorded"),
            ctx,
        );
    }

    /// `NODE_OUTPUT` — same preview/full-copy shape as `node_input`.
    pub fn node_output(&self, execution_id: ExecutionId, node_id: NodeId, node_name: &str, output: &Value) {
        let mut ctx = Self::node_context(node_id, node_name);
        ctx.insert("outputPreview".into(), Value::String(preview(output, PREVIEW_CHARS)));
        ctx.insert("outputDataFull".into(), output.clone());
        self.emit(
            execution_id,
            LogLevel::Trace,
            LogCategory::NodeOutput,
            format!("node '{node_name}' output recorded"),
            ctx,
        );
    }

    /// `EXPRESSION_EVAL` — reserved for executor use (the core engine does
    /// not evaluate expressions itself).
    pub fn expression_eval(&self, execution_id: ExecutionId, expression: &str, result_preview: &str, success: bool) {
        let mut ctx = LogContext::new();
        ctx.insert("expression".into(), Value::String(truncate(expression, EXPRESSION_CHARS)));
        ctx.insert("resultPreview".into(), Value::String(result_preview.to_string()));
        ctx.insert("success".into(), Value::Bool(success));
        self.emit(
            execution_id,
            LogLevel::Debug,
            LogCategory::ExpressionEval,
            "expression evaluated",
            ctx,
        );
    }

    /// `ERROR` — additionally captures error type, root-cause type, the
    /// first user-code stack frame, and a truncated input-at-error preview
    /// (`spec.md` §4.3).
    #[allow(clippy::too_many_arguments)]
    pub fn error_with_context(
        &self,
        execution_id: ExecutionId,
        node_id: Option<NodeId>,
        node_name: Option<&str>,
        input_at_error: Option<&Value>,
        error_type: &str,
        error_message: &str,
        source_location: Option<&str>,
        root_cause: Option<(&str, &str)>,
    ) {
        let mut ctx = LogContext::new();
        if let Some(id) = node_id {
            ctx.insert("nodeId".into(), Value::String(id.to_string()));
        }
        if let Some(name) = node_name {
            ctx.insert("nodeName".into(), Value::String(name.to_string()));
        }
        if let Some(input) = input_at_error {
            ctx.insert("inputAtErrorPreview".into(), Value::String(preview(input, PREVIEW_CHARS)));
        }
        ctx.insert("errorType".into(), Value::String(error_type.to_string()));
        ctx.insert("errorMessage".into(), Value::String(error_message.to_string()));
        if let Some(location) = source_location {
            ctx.insert("sourceLocation".into(), Value::String(location.to_string()));
        }
        if let Some((rc_type, rc_message)) = root_cause {
            ctx.insert("rootCauseType".into(), Value::String(rc_type.to_string()));
            ctx.insert("rootCauseMessage".into(), Value::String(rc_message.to_string()));
        }
        self.emit(
            execution_id,
            LogLevel::Error,
            LogCategory::Error,
            error_message,
            ctx,
        );
    }

    /// Snapshot the full buffer for one execution, in append order.
    #[must_use]
    pub fn entries(&self, execution_id: ExecutionId) -> Vec<LogEntry> {
        self.buffers
            .get(&execution_id)
            .map(|buf| buf.lock().clone())
            .unwrap_or_default()
    }

    /// Serialize an execution's buffer to a JSON array.
    #[must_use]
    pub fn export(&self, execution_id: ExecutionId) -> Value {
        serde_json::to_value(self.entries(execution_id)).unwrap_or(Value::Array(Vec::new()))
    }

    /// Compute aggregate counts for one execution's buffer.
    #[must_use]
    pub fn summary(&self, execution_id: ExecutionId) -> ExecutionLogSummary {
        let entries = self.entries(execution_id);
        let mut summary = ExecutionLogSummary::default();

        let mut start_ts = None;
        let mut end_ts = None;

        for entry in &entries {
            *summary.counts_by_level.entry(entry.level).or_insert(0) += 1;
            match entry.category {
                LogCategory::NodeEnd => summary.node_count += 1,
                LogCategory::ExecutionStart => start_ts = Some(entry.timestamp),
                LogCategory::ExecutionEnd => {
                    end_ts = Some(entry.timestamp);
                    summary.success = entry.context.get("success").and_then(Value::as_bool);
                }
                _ => {}
            }
        }

        if let (Some(start), Some(end)) = (start_ts, end_ts) {
            summary.duration_ms = Some((end - start).num_milliseconds());
        }

        summary
    }

    /// Clear a single execution's buffer.
    pub fn clear(&self, execution_id: ExecutionId) {
        self.buffers.remove(&execution_id);
    }

    /// Clear every execution's buffer.
    pub fn clear_all(&self) {
        self.buffers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::HttpTraceSink;
    use nebula_wf_core::{ExecutionId, SystemClock, WorkflowId};

    fn logger() -> ExecutionLogger {
        ExecutionLogger::new(Arc::new(SystemClock))
    }

    #[test]
    fn start_then_node_lifecycle_appends_entries() {
        let log = logger();
        let exec_id = ExecutionId::v4();
        let node_id = NodeId::v4();
        log.start_execution(exec_id, WorkflowId::v4(), "wf");
        log.node_start(exec_id, node_id, "A");
        log.node_input(exec_id, node_id, "A", &serde_json::json!({"x": 1}));
        log.node_output(exec_id, node_id, "A", &serde_json::json!({"x": 1}));
        log.node_end(exec_id, node_id, "A", true);
        log.end_execution(exec_id, true, Some(&serde_json::json!({"x": 1})));

        let entries = log.entries(exec_id);
        assert_eq!(entries.len(), 6);
        assert_eq!(entries[0].category, LogCategory::ExecutionStart);
        assert_eq!(entries.last().unwrap().category, LogCategory::ExecutionEnd);
    }

    #[test]
    fn node_input_carries_preview_and_full_copy() {
        let log = logger();
        let exec_id = ExecutionId::v4();
        let node_id = NodeId::v4();
        let payload = serde_json::json!({"value": "x".repeat(200)});
        log.node_input(exec_id, node_id, "A", &payload);

        let entries = log.entries(exec_id);
        let entry = &entries[0];
        let full = entry.context.get("inputDataFull").unwrap();
        assert_eq!(full, &payload);
        let preview = entry.context.get("inputPreview").unwrap().as_str().unwrap();
        assert!(preview.len() < payload.to_string().len());
    }

    #[test]
    fn summary_counts_nodes_and_duration() {
        let log = logger();
        let exec_id = ExecutionId::v4();
        log.start_execution(exec_id, WorkflowId::v4(), "wf");
        log.node_start(exec_id, NodeId::v4(), "A");
        log.node_end(exec_id, NodeId::v4(), "A", true);
        log.node_end(exec_id, NodeId::v4(), "B", true);
        log.end_execution(exec_id, true, None);

        let summary = log.summary(exec_id);
        assert_eq!(summary.node_count, 2);
        assert_eq!(summary.success, Some(true));
        assert!(summary.duration_ms.unwrap() >= 0);
    }

    #[test]
    fn clear_removes_buffer() {
        let log = logger();
        let exec_id = ExecutionId::v4();
        log.start_execution(exec_id, WorkflowId::v4(), "wf");
        assert!(!log.entries(exec_id).is_empty());
        log.clear(exec_id);
        assert!(log.entries(exec_id).is_empty());
    }

    #[test]
    fn capacity_cap_evicts_oldest() {
        let log = ExecutionLogger::with_capacity(Arc::new(SystemClock), 2);
        let exec_id = ExecutionId::v4();
        log.node_start(exec_id, NodeId::v4(), "A");
        log.node_start(exec_id, NodeId::v4(), "B");
        log.node_start(exec_id, NodeId::v4(), "C");
        assert_eq!(log.entries(exec_id).len(), 2);
    }

    #[test]
    fn sinks_receive_every_entry() {
        let log = logger();
        let sink = Arc::new(HttpTraceSink::new(10));
        log.add_sink(sink.clone());

        let exec_id = ExecutionId::v4();
        log.start_execution(exec_id, WorkflowId::v4(), "wf");
        log.node_start(exec_id, NodeId::v4(), "A");

        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn removed_sink_stops_receiving() {
        let log = logger();
        let sink: Arc<dyn LogSink> = Arc::new(HttpTraceSink::new(10));
        log.add_sink(sink.clone());
        log.remove_sink(&sink);

        log.start_execution(ExecutionId::v4(), WorkflowId::v4(), "wf");
        // No direct assertion possible on a trait object without downcasting;
        // this at minimum exercises remove_sink without panicking and
        // without calling into the removed sink.
    }

    #[test]
    fn error_with_context_captures_root_cause() {
        let log = logger();
        let exec_id = ExecutionId::v4();
        log.error_with_context(
            exec_id,
            Some(NodeId::v4()),
            Some("B"),
            Some(&serde_json::json!({"x": 1})),
            "NodeExecutionFailed",
            "boom",
            Some("engine.rs:42"),
            Some(("IoError", "connection refused")),
        );
        let entries = log.entries(exec_id);
        let ctx = &entries[0].context;
        assert_eq!(ctx.get("rootCauseType").unwrap(), "IoError");
        assert_eq!(ctx.get("errorType").unwrap(), "NodeExecutionFailed");
    }
}
