//! The file-event trigger (C9): one OS-level watch per workflow, polled on
//! a dedicated worker with a 500 ms timeout (`spec.md` §4.4.2).

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use nebula_wf_core::{Clock, WorkflowId};
use nebula_wf_engine::WorkflowEngine;
use nebula_wf_model::{Node, TriggerType, Workflow};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use regex::Regex;
use tracing::{info, warn};

use crate::error::TriggerError;

const POLL_TIMEOUT: Duration = Duration::from_millis(500);

struct WatchedWorkflow {
    workflow_id: WorkflowId,
    watch_path: PathBuf,
    pattern: Regex,
    event_types: HashSet<String>,
    _watcher: RecommendedWatcher,
}

/// One background poller shared by every registered workflow; each
/// registration owns its own `notify::Watcher` instance and filter state.
pub struct FileEventTrigger {
    engine: Arc<WorkflowEngine>,
    clock: Arc<dyn Clock>,
    watches: DashMap<WorkflowId, WatchedWorkflow>,
}

impl FileEventTrigger {
    #[must_use]
    pub fn new(engine: Arc<WorkflowEngine>, clock: Arc<dyn Clock>) -> Self {
        Self {
            engine,
            clock,
            watches: DashMap::new(),
        }
    }

    /// Register a watch for `workflow`'s trigger node. Re-registering the
    /// same workflow id cancels the prior watch first (`spec.md` §4.4.2).
    pub fn register(self: &Arc<Self>, workflow: &Workflow, trigger_node: &Node) -> Result<(), TriggerError> {
        let watch_path = required_string(trigger_node, "watchPath")?;
        let file_pattern = optional_string(trigger_node, "filePattern").unwrap_or_else(|| "*".to_string());
        let event_types = optional_string(trigger_node, "eventTypes")
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_uppercase())
                    .filter(|s| !s.is_empty())
                    .collect::<HashSet<_>>()
            })
            .unwrap_or_else(|| ["CREATE", "MODIFY", "DELETE"].iter().map(|s| s.to_string()).collect());

        let pattern = glob_to_regex(&file_pattern);

        self.unregister(workflow.id);

        let (tx, rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(tx).map_err(|e| TriggerError::WatchFailed {
            path: watch_path.clone(),
            reason: e.to_string(),
        })?;
        watcher
            .watch(Path::new(&watch_path), RecursiveMode::NonRecursive)
            .map_err(|e| TriggerError::WatchFailed {
                path: watch_path.clone(),
                reason: e.to_string(),
            })?;

        let workflow_id = workflow.id;
        let this = self.clone();
        tokio::task::spawn_blocking(move || this.poll_loop(workflow_id, rx));

        self.watches.insert(
            workflow_id,
            WatchedWorkflow {
                workflow_id,
                watch_path: PathBuf::from(&watch_path),
                pattern,
                event_types,
                _watcher: watcher,
            },
        );
        Ok(())
    }

    /// Drop the watch for `workflow_id`, if any. Idempotent.
    pub fn unregister(&self, workflow_id: WorkflowId) {
        self.watches.remove(&workflow_id);
    }

    /// `true` if a watch is currently active for `workflow_id`.
    #[must_use]
    pub fn is_registered(&self, workflow_id: WorkflowId) -> bool {
        self.watches.contains_key(&workflow_id)
    }

    fn poll_loop(&self, workflow_id: WorkflowId, rx: mpsc::Receiver<notify::Result<notify::Event>>) {
        loop {
            if !self.watches.contains_key(&workflow_id) {
                return;
            }
            match rx.recv_timeout(POLL_TIMEOUT) {
                Ok(Ok(event)) => self.handle_event(workflow_id, event),
                Ok(Err(e)) => warn!(%workflow_id, error = %e, "file watch error"),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return,
            }
        }
    }

    fn handle_event(&self, workflow_id: WorkflowId, event: notify::Event) {
        if matches!(event.kind, EventKind::Other) && is_overflow(&event) {
            return;
        }
        let Some(kind) = classify(&event.kind) else {
            return;
        };

        let Some(entry) = self.watches.get(&workflow_id) else {
            return;
        };
        if !entry.event_types.iter().any(|t| kind.eq_ignore_ascii_case(t)) {
            return;
        }

        for path in &event.paths {
            let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            if !entry.pattern.is_match(file_name) {
                continue;
            }

            let triggered_at = self.clock.now();
            let directory = entry.watch_path.to_string_lossy().to_string();
            let input = serde_json::json!({
                "triggeredAt": triggered_at,
                "triggerType": "file_event",
                "eventType": kind,
                "filePath": path.to_string_lossy(),
                "fileName": file_name,
                "directory": directory,
            });

            info!(%workflow_id, file_name, kind, "file event matched");
            let engine = self.engine.clone();
            tokio::spawn(async move {
                if let Err(e) = engine.submit(workflow_id, TriggerType::FileEvent, input).await {
                    warn!(%workflow_id, error = %e, "file-event execution failed");
                }
            });
        }
    }
}

fn is_overflow(event: &notify::Event) -> bool {
    format!("{:?}", event.kind).contains("Overflow")
}

/// Normalizes a `notify` event kind to the `CREATE`/`MODIFY`/`DELETE`
/// vocabulary used by `eventTypes` (`spec.md` §4.4.2 strips any `ENTRY_`
/// prefix from the OS-native kind before comparing).
fn classify(kind: &EventKind) -> Option<&'static str> {
    match kind {
        EventKind::Create(_) => Some("CREATE"),
        EventKind::Modify(_) => Some("MODIFY"),
        EventKind::Remove(_) => Some("DELETE"),
        _ => None,
    }
}

fn required_string(node: &Node, key: &str) -> Result<String, TriggerError> {
    node.parameters
        .get(key)
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| TriggerError::MissingParameter(key.to_string()))
}

fn optional_string(node: &Node, key: &str) -> Option<String> {
    node.parameters.get(key).and_then(|v| v.as_str()).map(str::to_string)
}

/// Translate a glob pattern to a regex using the literal character-by-
/// character rule from `spec.md` §4.4.2: `.` is a literal dot, `*` matches
/// any run of characters, `?` matches exactly one character.
fn glob_to_regex(pattern: &str) -> Regex {
    if pattern.is_empty() {
        return Regex::new(".*").expect("literal match-all pattern is valid");
    }
    let mut out = String::from("^");
    for c in pattern.chars() {
        match c {
            '.' => out.push_str("\\."),
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            other => out.push_str(&regex::escape(&other.to_string())),
        }
    }
    out.push('$');
    Regex::new(&out).unwrap_or_else(|_| Regex::new("$^").expect("empty-match fallback is valid"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_pattern_matches_every_file() {
        let re = glob_to_regex("");
        assert!(re.is_match("anything.csv"));
        assert!(re.is_match(""));
    }

    #[test]
    fn glob_star_matches_any_run() {
        let re = glob_to_regex("*.txt");
        assert!(re.is_match("report.txt"));
        assert!(re.is_match(".txt"));
        assert!(!re.is_match("report.txt.bak"));
    }

    #[test]
    fn glob_question_mark_matches_one_char() {
        let re = glob_to_regex("file?.csv");
        assert!(re.is_match("file1.csv"));
        assert!(!re.is_match("file12.csv"));
        assert!(!re.is_match("file.csv"));
    }

    #[test]
    fn glob_dot_is_literal() {
        let re = glob_to_regex("a.b");
        assert!(re.is_match("a.b"));
        assert!(!re.is_match("axb"));
    }

    #[test]
    fn classify_maps_create_modify_remove_and_ignores_other() {
        assert_eq!(classify(&EventKind::Create(notify::event::CreateKind::File)), Some("CREATE"));
        assert_eq!(classify(&EventKind::Modify(notify::event::ModifyKind::Any)), Some("MODIFY"));
        assert_eq!(classify(&EventKind::Remove(notify::event::RemoveKind::File)), Some("DELETE"));
        assert_eq!(classify(&EventKind::Access(notify::event::AccessKind::Any)), None);
    }

    #[test]
    fn missing_watch_path_is_rejected() {
        let node = Node::new(nebula_wf_core::NodeId::v4(), "file_event", "watcher");
        let err = required_string(&node, "watchPath").unwrap_err();
        assert!(matches!(err, TriggerError::MissingParameter(k) if k == "watchPath"));
    }

    #[test]
    fn default_event_types_cover_all_three_kinds() {
        let node = Node::new(nebula_wf_core::NodeId::v4(), "file_event", "watcher");
        assert!(optional_string(&node, "eventTypes").is_none());
    }
}
