//! The credential resolver (C6): resolves opaque credential ids/names to
//! decrypted secret strings.
//!
//! This is an external-collaborator interface only (`spec.md` §1, §6) — the
//! full credential store (encryption at rest, multi-tenant scoping, caching)
//! lives outside this crate's scope. [`InMemoryCredentialStore`] exists to
//! exercise executors and engine tests against a real implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::CredentialError;

/// A resolved credential's public metadata (never the secret itself).
#[derive(Debug, Clone)]
pub struct CredentialInfo {
    /// Opaque store-assigned id.
    pub id: String,
    /// Human-assigned name, unique within the store.
    pub name: String,
}

/// Resolves credential ids/names to decrypted secret strings.
///
/// Exposed to executors via the execution context; the engine itself never
/// calls this directly (`spec.md` §6).
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Decrypt and return the secret for `id`.
    async fn decrypted_by_id(&self, id: &str) -> Result<String, CredentialError>;

    /// Look up a credential's metadata by its unique name.
    async fn find_by_name(&self, name: &str) -> Result<Option<CredentialInfo>, CredentialError>;
}

/// An in-memory `CredentialStore`, for tests and local development.
///
/// Secrets are held in plaintext in the process — never use outside tests.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    by_id: RwLock<HashMap<String, (CredentialInfo, String)>>,
    name_to_id: RwLock<HashMap<String, String>>,
}

impl InMemoryCredentialStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a credential, replacing any prior secret under the same id.
    pub fn insert(&self, id: impl Into<String>, name: impl Into<String>, secret: impl Into<String>) {
        let id = id.into();
        let name = name.into();
        self.name_to_id.write().insert(name.clone(), id.clone());
        self.by_id
            .write()
            .insert(id.clone(), (CredentialInfo { id, name }, secret.into()));
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn decrypted_by_id(&self, id: &str) -> Result<String, CredentialError> {
        self.by_id
            .read()
            .get(id)
            .map(|(_, secret)| secret.clone())
            .ok_or_else(|| CredentialError::NotFound(id.to_string()))
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<CredentialInfo>, CredentialError> {
        let name_to_id = self.name_to_id.read();
        let Some(id) = name_to_id.get(name) else {
            return Ok(None);
        };
        Ok(self.by_id.read().get(id).map(|(info, _)| info.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn decrypted_by_id_returns_secret() {
        let store = InMemoryCredentialStore::new();
        store.insert("cred-1", "github", "s3cr3t");
        assert_eq!(store.decrypted_by_id("cred-1").await.unwrap(), "s3cr3t");
    }

    #[tokio::test]
    async fn decrypted_by_id_missing_is_not_found() {
        let store = InMemoryCredentialStore::new();
        assert!(matches!(
            store.decrypted_by_id("missing").await,
            Err(CredentialError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn find_by_name_resolves_via_index() {
        let store = InMemoryCredentialStore::new();
        store.insert("cred-1", "github", "s3cr3t");
        let info = store.find_by_name("github").await.unwrap().unwrap();
        assert_eq!(info.id, "cred-1");
    }

    #[tokio::test]
    async fn find_by_name_unknown_returns_none() {
        let store = InMemoryCredentialStore::new();
        assert!(store.find_by_name("nope").await.unwrap().is_none());
    }
}
