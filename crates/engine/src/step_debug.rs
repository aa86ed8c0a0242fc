//! The step-debug controller (C5): pauses the engine after each node until
//! an external continue/cancel signal arrives.
//!
//! The source this specification is drawn from shares one latch across
//! every execution, which is a bug once two executions run concurrently —
//! pausing one run pauses all of them. This implementation scopes a
//! [`StepDebugSession`] to a single execution instead; [`StepDebugRegistry`]
//! is the engine-held table keyed by `ExecutionId` that replaces the
//! process-wide singleton.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;
use nebula_wf_core::{ExecutionId, NodeId};
use parking_lot::Mutex;
use tokio::sync::oneshot;

/// One execution's step-debug state.
pub struct StepDebugSession {
    enabled: AtomicBool,
    cancelled: AtomicBool,
    paused_node: Mutex<Option<NodeId>>,
    release: Mutex<Option<oneshot::Sender<bool>>>,
}

impl Default for StepDebugSession {
    fn default() -> Self {
        Self {
            enabled: AtomicBool::new(false),
            cancelled: AtomicBool::new(false),
            paused_node: Mutex::new(None),
            release: Mutex::new(None),
        }
    }
}

impl StepDebugSession {
    /// A fresh, disabled session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle step mode for this execution.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    /// `true` if step mode is on.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// The node currently paused, if any.
    #[must_use]
    pub fn paused_node(&self) -> Option<NodeId> {
        *self.paused_node.lock()
    }

    /// Called by the engine before advancing past `node_id`.
    ///
    /// Returns `true` immediately if step mode is disabled or this session
    /// was already cancelled. Otherwise blocks until
    /// [`StepDebugSession::continue_step`] (returns `true`) or
    /// [`StepDebugSession::cancel_step_execution`] (returns `false`).
    pub async fn wait_for_step(&self, node_id: NodeId) -> bool {
        if !self.is_enabled() || self.cancelled.load(Ordering::SeqCst) {
            return !self.cancelled.load(Ordering::SeqCst);
        }

        let (tx, rx) = oneshot::channel();
        *self.paused_node.lock() = Some(node_id);
        *self.release.lock() = Some(tx);

        let outcome = rx.await.unwrap_or(false);
        *self.paused_node.lock() = None;
        outcome
    }

    /// Release a paused `wait_for_step` with "continue".
    pub fn continue_step(&self) {
        if let Some(tx) = self.release.lock().take() {
            let _ = tx.send(true);
        }
    }

    /// Release a paused `wait_for_step` with "cancel"; every subsequent
    /// `wait_for_step` on this session returns `false` without pausing.
    pub fn cancel_step_execution(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        if let Some(tx) = self.release.lock().take() {
            let _ = tx.send(false);
        }
    }

    /// Clear the cancelled flag and paused node. Called at each execution
    /// start.
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
        *self.paused_node.lock() = None;
        *self.release.lock() = None;
    }
}

/// Engine-held table of step-debug sessions, one per live execution.
///
/// Replaces the process-wide singleton controller the source used; see the
/// module docs for why.
#[derive(Default)]
pub struct StepDebugRegistry {
    sessions: DashMap<ExecutionId, Arc<StepDebugSession>>,
}

impl StepDebugRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the session for `execution_id`, resetting it.
    pub fn start_session(&self, execution_id: ExecutionId) -> Arc<StepDebugSession> {
        let session = self
            .sessions
            .entry(execution_id)
            .or_insert_with(|| Arc::new(StepDebugSession::new()))
            .clone();
        session.reset();
        session
    }

    /// Fetch a live session, if the execution is still running.
    #[must_use]
    pub fn session(&self, execution_id: ExecutionId) -> Option<Arc<StepDebugSession>> {
        self.sessions.get(&execution_id).map(|entry| entry.clone())
    }

    /// Drop the session for a terminated execution.
    pub fn end_session(&self, execution_id: ExecutionId) {
        self.sessions.remove(&execution_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_session_never_pauses() {
        let session = StepDebugSession::new();
        assert!(session.wait_for_step(NodeId::v4()).await);
    }

    #[tokio::test]
    async fn continue_step_releases_pause() {
        let session = Arc::new(StepDebugSession::new());
        session.set_enabled(true);
        let node_id = NodeId::v4();

        let waiter = {
            let session = session.clone();
            tokio::spawn(async move { session.wait_for_step(node_id).await })
        };

        while session.paused_node() != Some(node_id) {
            tokio::task::yield_now().await;
        }
        session.continue_step();
        assert!(waiter.await.unwrap());
        assert!(session.paused_node().is_none());
    }

    #[tokio::test]
    async fn cancel_step_execution_releases_with_false() {
        let session = Arc::new(StepDebugSession::new());
        session.set_enabled(true);
        let node_id = NodeId::v4();

        let waiter = {
            let session = session.clone();
            tokio::spawn(async move { session.wait_for_step(node_id).await })
        };

        while session.paused_node() != Some(node_id) {
            tokio::task::yield_now().await;
        }
        session.cancel_step_execution();
        assert!(!waiter.await.unwrap());
    }

    #[tokio::test]
    async fn cancelled_session_stays_cancelled_until_reset() {
        let session = Arc::new(StepDebugSession::new());
        session.set_enabled(true);
        session.cancel_step_execution();
        assert!(!session.wait_for_step(NodeId::v4()).await);

        session.reset();
        let node_id = NodeId::v4();
        let waiter = {
            let session = session.clone();
            tokio::spawn(async move { session.wait_for_step(node_id).await })
        };
        while session.paused_node() != Some(node_id) {
            tokio::task::yield_now().await;
        }
        session.continue_step();
        assert!(waiter.await.unwrap());
    }

    #[test]
    fn registry_start_session_resets_prior_state() {
        let registry = StepDebugRegistry::new();
        let exec_id = ExecutionId::v4();
        let session = registry.start_session(exec_id);
        session.cancel_step_execution();
        let same = registry.start_session(exec_id);
        assert!(Arc::ptr_eq(&session, &same));
    }

    #[test]
    fn registry_end_session_drops_entry() {
        let registry = StepDebugRegistry::new();
        let exec_id = ExecutionId::v4();
        registry.start_session(exec_id);
        registry.end_session(exec_id);
        assert!(registry.session(exec_id).is_none());
    }
}
