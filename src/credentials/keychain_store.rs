//! credentials::keychain_store
//!
//! OS keychain credential storage.
//!
//! # Platform Support
//!
//! This module uses the `keyring` crate which supports:
//! - macOS: Keychain
//! - Windows: Credential Manager
//! - Linux: Secret Service (via D-Bus)
//!
//! # Feature Flag
//!
//! Only available with the `keychain` feature flag. Without it, the stub
//! implementation reports the backend as unavailable and the store falls
//! back to the encrypted file.
//!
//! # Entry Layout
//!
//! One keychain entry per service name (e.g. "gitsuper-acme"), all under
//! the account "default", payload = the JSON-serialized token record.

#[cfg(feature = "keychain")]
use keyring::Entry;

use super::traits::{StorageBackend, StorageError};

/// Keychain account name used for every entry.
const KEYCHAIN_ACCOUNT: &str = "default";

/// Keychain-based credential storage.
#[cfg(feature = "keychain")]
#[derive(Debug)]
pub struct KeychainBackend {
    _private: (),
}

#[cfg(feature = "keychain")]
impl KeychainBackend {
    /// Create a new keychain backend.
    pub fn new() -> Self {
        Self { _private: () }
    }

    /// Probe whether the OS keychain is usable.
    ///
    /// Performs one read of a probe entry; a missing entry counts as a
    /// working keychain, a platform error (no daemon, no API) does not.
    /// Callers cache the result — this must not be re-run per operation.
    pub fn available() -> bool {
        let entry = match Entry::new("gitsuper-probe", KEYCHAIN_ACCOUNT) {
            Ok(entry) => entry,
            Err(_) => return false,
        };
        match entry.get_password() {
            Ok(_) | Err(keyring::Error::NoEntry) => true,
            Err(_) => false,
        }
    }

    /// Create a keyring entry for the given service.
    fn entry(&self, service: &str) -> Result<Entry, StorageError> {
        Entry::new(service, KEYCHAIN_ACCOUNT)
            .map_err(|e| StorageError::Read(format!("cannot create keyring entry: {}", e)))
    }
}

#[cfg(feature = "keychain")]
impl Default for KeychainBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "keychain")]
impl StorageBackend for KeychainBackend {
    fn get(&self, service: &str) -> Result<Option<String>, StorageError> {
        let entry = self.entry(service)?;

        match entry.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(keyring::Error::Ambiguous(_)) => {
                Err(StorageError::Read("ambiguous keychain entry".to_string()))
            }
            Err(e) => Err(StorageError::Read(format!(
                "cannot read from keychain: {}",
                e
            ))),
        }
    }

    fn set(&self, service: &str, value: &str) -> Result<(), StorageError> {
        let entry = self.entry(service)?;

        entry
            .set_password(value)
            .map_err(|e| StorageError::Write(format!("cannot write to keychain: {}", e)))
    }

    fn delete(&self, service: &str) -> Result<(), StorageError> {
        let entry = self.entry(service)?;

        match entry.delete_credential() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()), // Already gone, that's fine
            Err(e) => Err(StorageError::Delete(format!(
                "cannot delete from keychain: {}",
                e
            ))),
        }
    }
}

// Stub implementation when the keychain feature is disabled
#[cfg(not(feature = "keychain"))]
#[derive(Debug)]
pub struct KeychainBackend {
    _private: (),
}

#[cfg(not(feature = "keychain"))]
impl KeychainBackend {
    /// Without the `keychain` feature the backend is never available.
    pub fn available() -> bool {
        false
    }

    pub fn new() -> Self {
        Self { _private: () }
    }
}

#[cfg(not(feature = "keychain"))]
impl Default for KeychainBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(not(feature = "keychain"))]
impl StorageBackend for KeychainBackend {
    fn get(&self, _service: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::BackendUnavailable(
            "keychain support not enabled (compile with --features keychain)".into(),
        ))
    }

    fn set(&self, _service: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::BackendUnavailable(
            "keychain support not enabled (compile with --features keychain)".into(),
        ))
    }

    fn delete(&self, _service: &str) -> Result<(), StorageError> {
        Err(StorageError::BackendUnavailable(
            "keychain support not enabled (compile with --features keychain)".into(),
        ))
    }
}
