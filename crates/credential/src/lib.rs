//! The credential resolver (C6) — an external-collaborator interface.

pub mod error;
pub mod store;

pub use error::CredentialError;
pub use store::{CredentialInfo, CredentialStore, InMemoryCredentialStore};
