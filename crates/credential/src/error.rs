//! Errors surfaced by a [`crate::store::CredentialStore`].

use thiserror::Error;

/// Failure resolving a credential.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// No credential registered under the given id or name.
    #[error("credential not found: {0}")]
    NotFound(String),
    /// The backing secret store rejected the request (network, auth, etc).
    #[error("credential backend error: {0}")]
    Backend(String),
}
