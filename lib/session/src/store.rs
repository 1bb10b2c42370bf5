//! Credential persistence.
//!
//! The store is a passive facade over wherever the bearer token lives.
//! It performs no validation and no network calls; only the session
//! provider, the sign-in flow, and the rejection path write to it.

use std::fmt;
use std::path::PathBuf;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// An opaque bearer credential.
///
/// The core assumes nothing about the token beyond "present or absent"
/// and "accepted or rejected by the identity endpoint".
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    /// Wraps a raw bearer token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token for use in an `Authorization` header.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    /// The token text never appears in logs or panic messages.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Storage for the bearer credential.
///
/// Operations are infallible from the caller's point of view; failures
/// of the underlying medium are absorbed by the implementation.
pub trait CredentialStore: Send + Sync {
    /// Returns the stored credential, if any.
    fn get(&self) -> Option<Credential>;

    /// Persists a credential, replacing any previous one.
    fn set(&self, credential: Credential);

    /// Removes the stored credential. Idempotent.
    fn remove(&self);
}

/// In-memory credential store for tests and short-lived embeddings.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    credential: Mutex<Option<Credential>>,
}

impl InMemoryCredentialStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn get(&self) -> Option<Credential> {
        self.credential.lock().clone()
    }

    fn set(&self, credential: Credential) {
        *self.credential.lock() = Some(credential);
    }

    fn remove(&self) {
        *self.credential.lock() = None;
    }
}

/// File-backed credential store.
///
/// Persists the token across application restarts, taking the place of
/// the browser-local storage a web client would use. I/O failures are
/// logged and otherwise swallowed to keep the trait contract infallible.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    /// Creates a store backed by the given file path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self) -> Option<Credential> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => {
                let token = contents.trim();
                if token.is_empty() {
                    None
                } else {
                    Some(Credential::new(token))
                }
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
            Err(err) => {
                tracing::warn!(error = %err, path = %self.path.display(), "failed to read credential");
                None
            }
        }
    }

    fn set(&self, credential: Credential) {
        if let Err(err) = std::fs::write(&self.path, credential.as_str()) {
            tracing::warn!(error = %err, path = %self.path.display(), "failed to persist credential");
        }
    }

    fn remove(&self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => {
                tracing::warn!(error = %err, path = %self.path.display(), "failed to remove credential");
            }
        }
    }
}
