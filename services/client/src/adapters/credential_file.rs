//! services/client/src/adapters/credential_file.rs
//!
//! File-backed implementation of the `CredentialStore` port: a small JSON
//! document holding the two session tokens, replaced whole on every write.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use studio_client_core::domain::Credential;
use studio_client_core::ports::{CredentialStore, StoreError};
use tracing::warn;

#[derive(Serialize, Deserialize)]
struct StoredCredential {
    psid: String,
    psidts: String,
}

/// Persists the credential pair in a JSON file under the app data directory.
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl CredentialStore for FileCredentialStore {
    /// A missing or unreadable file is the valid "unset" state: the backend,
    /// not the client, decides whether requests without credentials fail.
    fn read(&self) -> Option<Credential> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(_) => return None,
        };
        match serde_json::from_str::<StoredCredential>(&raw) {
            Ok(stored) => Some(Credential {
                psid: stored.psid,
                psidts: stored.psidts,
            }),
            Err(e) => {
                warn!("Ignoring malformed credential file {:?}: {}", self.path, e);
                None
            }
        }
    }

    fn write(&self, credential: &Credential) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let stored = StoredCredential {
            psid: credential.psid.clone(),
            psidts: credential.psidts.clone(),
        };
        let raw = serde_json::to_string_pretty(&stored)
            .map_err(|e| StoreError::Malformed(e.to_string()))?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }
}
