//! The node executor registry (C4): a bi-directional map `nodeType →
//! Executor`.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::warn;

use crate::error::RegistryError;
use crate::executor::NodeExecutor;

/// Insertion-time map from node type to executor.
///
/// Populated once at startup from built-in executors and again from the
/// plugin loader (C11); runtime register/unregister is also supported
/// (`spec.md` §4.2). Readers (the engine) and writers (the plugin loader,
/// dynamic register/unregister) may run concurrently.
#[derive(Default)]
pub struct ExecutorRegistry {
    executors: DashMap<String, Arc<dyn NodeExecutor>>,
}

impl ExecutorRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `executor` under its `node_type()`.
    ///
    /// Fails with [`RegistryError::DuplicateNodeType`] if that type is
    /// already registered (`spec.md` I10). Use
    /// [`ExecutorRegistry::register_or_replace`] for the plugin-loader
    /// override semantics in §4.6.
    pub fn register(&self, executor: Arc<dyn NodeExecutor>) -> Result<(), RegistryError> {
        let node_type = executor.node_type().to_string();
        if self.executors.contains_key(&node_type) {
            return Err(RegistryError::DuplicateNodeType(node_type));
        }
        self.executors.insert(node_type, executor);
        Ok(())
    }

    /// Register `executor`, overriding any prior registration under the
    /// same type and logging a warning when one existed.
    ///
    /// Grounded on `spec.md` §4.6: plugin-loader collisions with
    /// already-registered node types are logged as warnings and override
    /// the prior registration.
    pub fn register_or_replace(&self, executor: Arc<dyn NodeExecutor>) {
        let node_type = executor.node_type().to_string();
        if self.executors.insert(node_type.clone(), executor).is_some() {
            warn!(node_type = %node_type, "overriding previously-registered executor");
        }
    }

    /// Remove the executor registered under `node_type`, if any.
    pub fn unregister(&self, node_type: &str) -> bool {
        self.executors.remove(node_type).is_some()
    }

    /// Look up the executor for `node_type`.
    pub fn get(&self, node_type: &str) -> Result<Arc<dyn NodeExecutor>, RegistryError> {
        self.executors
            .get(node_type)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| RegistryError::UnknownNodeType(node_type.to_string()))
    }

    /// `true` if an executor is registered for `node_type`.
    #[must_use]
    pub fn has(&self, node_type: &str) -> bool {
        self.executors.contains_key(node_type)
    }

    /// Every currently-registered node type.
    #[must_use]
    pub fn types(&self) -> HashSet<String> {
        self.executors.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Number of registered executors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.executors.len()
    }

    /// `true` if no executors are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.executors.is_empty()
    }
}
