//! Durable, process-wide credential storage.
//!
//! One store instance is constructed at startup and injected into the client;
//! every interceptor reads and writes through it. The access/refresh pair is
//! atomic by construction: the API offers no way to set or clear one without
//! the other. The CSRF token rotates independently.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use atomicwrites::{AtomicFile, OverwriteBehavior};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::Error;

/// Keys addressable through [`CredentialStore::get`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKey {
    /// Short-lived bearer token.
    Access,
    /// Long-lived token exchanged for fresh credentials.
    Refresh,
    /// Anti-forgery token for mutating requests.
    Csrf,
}

/// Coarse authentication state, published on every credential transition.
///
/// A UI layer subscribes via [`CredentialStore::subscribe`] and treats a
/// switch to `Anonymous` as "navigate to the login screen".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Authenticated,
    Anonymous,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct Credentials {
    #[serde(skip_serializing_if = "Option::is_none")]
    access_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    csrf_token: Option<String>,
}

impl Credentials {
    fn auth_state(&self) -> AuthState {
        if self.access_token.is_some() {
            AuthState::Authenticated
        } else {
            AuthState::Anonymous
        }
    }
}

#[derive(Debug)]
struct Inner {
    creds: RwLock<Credentials>,
    path: Option<PathBuf>,
    auth_tx: watch::Sender<AuthState>,
}

/// Shared credential store.
///
/// Cloning is cheap and every clone observes the same state. Mutations are
/// last-writer-wins; persistence failures degrade to warnings so a full
/// disk never blocks the request path.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    inner: Arc<Inner>,
}

impl CredentialStore {
    /// Creates a store with no persistence. Tokens live only as long as the
    /// process.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_parts(Credentials::default(), None)
    }

    /// Opens (or creates) a store persisted at `path`.
    ///
    /// An existing file is loaded so credentials survive restarts. A corrupt
    /// file is treated as empty rather than refusing to start.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if the file exists but cannot be read.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        let creds = if path.exists() {
            let raw = std::fs::read(&path)
                .map_err(|e| Error::Storage(format!("{}: {e}", path.display())))?;
            match serde_json::from_slice(&raw) {
                Ok(creds) => creds,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "credential file unreadable, starting empty");
                    Credentials::default()
                }
            }
        } else {
            Credentials::default()
        };
        Ok(Self::from_parts(creds, Some(path)))
    }

    fn from_parts(creds: Credentials, path: Option<PathBuf>) -> Self {
        let (auth_tx, _) = watch::channel(creds.auth_state());
        Self {
            inner: Arc::new(Inner {
                creds: RwLock::new(creds),
                path,
                auth_tx,
            }),
        }
    }

    /// Reads a single credential.
    #[must_use]
    pub fn get(&self, key: CredentialKey) -> Option<String> {
        let creds = self
            .inner
            .creds
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        match key {
            CredentialKey::Access => creds.access_token.clone(),
            CredentialKey::Refresh => creds.refresh_token.clone(),
            CredentialKey::Csrf => creds.csrf_token.clone(),
        }
    }

    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        self.get(CredentialKey::Access)
    }

    #[must_use]
    pub fn refresh_token(&self) -> Option<String> {
        self.get(CredentialKey::Refresh)
    }

    #[must_use]
    pub fn csrf_token(&self) -> Option<String> {
        self.get(CredentialKey::Csrf)
    }

    /// Replaces the whole credential set in one step.
    ///
    /// Called on successful login, register, and refresh.
    pub fn set_session(
        &self,
        access: impl Into<String>,
        refresh: impl Into<String>,
        csrf: impl Into<String>,
    ) {
        self.mutate(|creds| {
            creds.access_token = Some(access.into());
            creds.refresh_token = Some(refresh.into());
            creds.csrf_token = Some(csrf.into());
        });
    }

    /// Replaces only the CSRF token (server-driven rotation).
    pub fn set_csrf(&self, csrf: impl Into<String>) {
        self.mutate(|creds| {
            creds.csrf_token = Some(csrf.into());
        });
    }

    /// Clears every credential. Published as [`AuthState::Anonymous`].
    pub fn clear_all(&self) {
        self.mutate(|creds| {
            *creds = Credentials::default();
        });
    }

    /// Current coarse authentication state.
    #[must_use]
    pub fn auth_state(&self) -> AuthState {
        *self.inner.auth_tx.borrow()
    }

    /// Subscribes to authentication-state transitions.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.inner.auth_tx.subscribe()
    }

    fn mutate(&self, f: impl FnOnce(&mut Credentials)) {
        let snapshot = {
            let mut creds = self
                .inner
                .creds
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            f(&mut creds);
            creds.clone()
        };
        self.inner.auth_tx.send_replace(snapshot.auth_state());
        self.persist(&snapshot);
    }

    fn persist(&self, creds: &Credentials) {
        let Some(path) = &self.inner.path else {
            return;
        };
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!(path = %path.display(), error = %e, "could not create credential directory");
                return;
            }
        }
        let body = match serde_json::to_vec_pretty(creds) {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "could not serialize credentials");
                return;
            }
        };
        let af = AtomicFile::new(path, OverwriteBehavior::AllowOverwrite);
        match af.write(|f| f.write_all(&body)) {
            Ok(()) => debug!(path = %path.display(), "credentials persisted"),
            Err(e) => warn!(path = %path.display(), error = %e, "credential write failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_store_reads_absent() {
        let store = CredentialStore::in_memory();
        assert!(store.access_token().is_none());
        assert!(store.refresh_token().is_none());
        assert!(store.csrf_token().is_none());
        assert_eq!(store.auth_state(), AuthState::Anonymous);
    }

    #[test]
    fn set_clear_round_trip() {
        let store = CredentialStore::in_memory();
        store.set_session("a", "r", "c");
        assert_eq!(store.access_token().as_deref(), Some("a"));
        assert_eq!(store.refresh_token().as_deref(), Some("r"));
        assert_eq!(store.csrf_token().as_deref(), Some("c"));
        assert_eq!(store.auth_state(), AuthState::Authenticated);

        store.clear_all();
        assert!(store.get(CredentialKey::Access).is_none());
        assert!(store.get(CredentialKey::Refresh).is_none());
        assert!(store.get(CredentialKey::Csrf).is_none());
        assert_eq!(store.auth_state(), AuthState::Anonymous);
    }

    #[test]
    fn csrf_rotates_independently() {
        let store = CredentialStore::in_memory();
        store.set_session("a", "r", "c1");
        store.set_csrf("c2");
        assert_eq!(store.csrf_token().as_deref(), Some("c2"));
        assert_eq!(store.access_token().as_deref(), Some("a"));
    }

    #[test]
    fn clones_share_state() {
        let store = CredentialStore::in_memory();
        let other = store.clone();
        other.set_session("a", "r", "c");
        assert_eq!(store.access_token().as_deref(), Some("a"));
    }

    #[test]
    fn watch_publishes_transitions() {
        let store = CredentialStore::in_memory();
        let rx = store.subscribe();
        assert_eq!(*rx.borrow(), AuthState::Anonymous);

        store.set_session("a", "r", "c");
        assert_eq!(*rx.borrow(), AuthState::Authenticated);

        store.clear_all();
        assert_eq!(*rx.borrow(), AuthState::Anonymous);
    }

    #[test]
    fn persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");

        let store = CredentialStore::open(&path).unwrap();
        store.set_session("acc", "ref", "csrf");
        drop(store);

        let reopened = CredentialStore::open(&path).unwrap();
        assert_eq!(reopened.access_token().as_deref(), Some("acc"));
        assert_eq!(reopened.refresh_token().as_deref(), Some("ref"));
        assert_eq!(reopened.csrf_token().as_deref(), Some("csrf"));
        assert_eq!(reopened.auth_state(), AuthState::Authenticated);
    }

    #[test]
    fn clear_is_durable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");

        let store = CredentialStore::open(&path).unwrap();
        store.set_session("acc", "ref", "csrf");
        store.clear_all();
        drop(store);

        let reopened = CredentialStore::open(&path).unwrap();
        assert!(reopened.access_token().is_none());
        assert!(reopened.refresh_token().is_none());
        assert!(reopened.csrf_token().is_none());
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, b"not json").unwrap();

        let store = CredentialStore::open(&path).unwrap();
        assert!(store.access_token().is_none());
    }
}
