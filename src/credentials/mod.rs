//! credentials
//!
//! Durable, confidential storage for per-provider token records.
//!
//! # Architecture
//!
//! Records are stored through one of two [`StorageBackend`]s:
//!
//! - [`KeychainBackend`]: OS keychain (optional, feature-gated)
//! - [`EncryptedFileStore`]: AES-256-GCM encrypted file at
//!   `~/.gitsuper/credentials.enc` (always compiled in)
//!
//! The backend is probed ONCE when the store is opened; whichever backend
//! is detected governs get, set, and delete alike. Keychain
//! unavailability is never fatal — the store falls back to the encrypted
//! file and logs the fallback a single time.
//!
//! # Failure Semantics
//!
//! Reads degrade: a corrupted or foreign-machine file, or an unparsable
//! record, yields `None` rather than an error. A store that cannot be
//! read must never prevent the user from re-authenticating.
//!
//! # Example
//!
//! ```ignore
//! use gitsuper::credentials::CredentialStore;
//!
//! let store = CredentialStore::open()?;
//! store.set("gitsuper-acme", &record)?;
//!
//! if let Some(record) = store.get("gitsuper-acme") {
//!     // Use record.access_token (never print it!)
//! }
//! ```

mod file_store;
mod keychain_store;
mod traits;

use std::path::PathBuf;

use tracing::{debug, warn};

pub use file_store::EncryptedFileStore;
pub use keychain_store::KeychainBackend;
pub use traits::{StorageBackend, StorageError};

use crate::auth::TokenRecord;

/// Which backend a store ended up using. Diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMethod {
    /// OS keychain (macOS Keychain, Windows Credential Manager, Secret Service)
    Keychain,
    /// Encrypted file under the gitsuper data directory
    File,
}

impl std::fmt::Display for StorageMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageMethod::Keychain => write!(f, "keychain"),
            StorageMethod::File => write!(f, "file"),
        }
    }
}

/// Credential store over a single probed backend.
pub struct CredentialStore {
    backend: Box<dyn StorageBackend>,
    method: StorageMethod,
}

impl CredentialStore {
    /// Open the store at the default location (`~/.gitsuper/credentials.enc`).
    ///
    /// Probes the OS keychain once; if it is usable, all operations go
    /// through it and the file is never touched. Otherwise the encrypted
    /// file backend is used.
    pub fn open() -> Result<Self, StorageError> {
        Ok(Self::open_at(default_credentials_path()?))
    }

    /// Open the store with a specific credentials-file path.
    ///
    /// The keychain probe still applies; the path is only used when the
    /// file backend is selected. Primarily useful for testing.
    pub fn open_at(path: PathBuf) -> Self {
        if KeychainBackend::available() {
            debug!("using OS keychain for credential storage");
            return Self {
                backend: Box::new(KeychainBackend::new()),
                method: StorageMethod::Keychain,
            };
        }

        if cfg!(feature = "keychain") {
            warn!("OS keychain unavailable, falling back to encrypted file storage");
        }
        Self {
            backend: Box::new(EncryptedFileStore::at(path)),
            method: StorageMethod::File,
        }
    }

    /// Build a store over an explicit backend.
    ///
    /// Used by tests to substitute an in-memory backend.
    pub fn with_backend(backend: Box<dyn StorageBackend>, method: StorageMethod) -> Self {
        Self { backend, method }
    }

    /// Look up the token record for a service.
    ///
    /// Any storage or parse failure degrades to `None` so a damaged
    /// store reads as "not authenticated" instead of crashing callers.
    pub fn get(&self, service: &str) -> Option<TokenRecord> {
        match self.backend.get(service) {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!("stored credential for '{}' is unreadable: {}", service, e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!("credential read for '{}' failed: {}", service, e);
                None
            }
        }
    }

    /// Store a token record, overwriting any existing one.
    pub fn set(&self, service: &str, record: &TokenRecord) -> Result<(), StorageError> {
        let json = serde_json::to_string(record)
            .map_err(|e| StorageError::Write(format!("cannot serialize record: {}", e)))?;
        self.backend.set(service, &json)
    }

    /// Delete the record for a service. Idempotent.
    pub fn delete(&self, service: &str) -> Result<(), StorageError> {
        self.backend.delete(service)
    }

    /// Report which backend this store is using.
    pub fn storage_method(&self) -> StorageMethod {
        self.method
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("method", &self.method)
            .finish_non_exhaustive()
    }
}

/// Default credentials file path: `~/.gitsuper/credentials.enc`.
fn default_credentials_path() -> Result<PathBuf, StorageError> {
    let home = dirs::home_dir()
        .ok_or_else(|| StorageError::Read("cannot determine home directory".into()))?;
    Ok(home.join(".gitsuper").join("credentials.enc"))
}
