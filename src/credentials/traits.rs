//! credentials::traits
//!
//! Storage backend capability interface.
//!
//! # Design
//!
//! The `StorageBackend` trait defines a string-valued key/value interface
//! over whatever actually holds the credential material (OS keychain or
//! the encrypted file). Keys are service names like "gitsuper-acme"; the
//! backend stores them as-is without interpretation.
//!
//! # Security
//!
//! Implementations MUST:
//! - Never log, print, or include credential values in error messages
//! - Be thread-safe (Send + Sync)

use thiserror::Error;

/// Errors from credential storage operations.
///
/// Note: Error messages intentionally do not include credential values.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Failed to read from credential storage.
    #[error("failed to read credential: {0}")]
    Read(String),

    /// Failed to write to credential storage.
    #[error("failed to write credential: {0}")]
    Write(String),

    /// Failed to delete from credential storage.
    #[error("failed to delete credential: {0}")]
    Delete(String),

    /// Storage location permissions could not be established.
    #[error("permission error: {0}")]
    Permissions(String),

    /// Backend not available on this platform or build.
    #[error("storage backend not available: {0}")]
    BackendUnavailable(String),
}

/// Trait for credential storage backends.
///
/// Implementations must be thread-safe (Send + Sync) and must never
/// log, print, or include stored values in error messages.
///
/// Values are opaque strings (JSON-serialized token records); the backend
/// does not parse them.
pub trait StorageBackend: Send + Sync {
    /// Get a stored value by service name.
    ///
    /// Returns `Ok(Some(value))` if present, `Ok(None)` if absent, and
    /// `Err` only when the backend itself failed.
    fn get(&self, service: &str) -> Result<Option<String>, StorageError>;

    /// Store a value, overwriting any existing one for the service.
    fn set(&self, service: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a stored value.
    ///
    /// Returns `Ok(())` even if nothing was stored, making delete
    /// idempotent.
    fn delete(&self, service: &str) -> Result<(), StorageError>;
}
