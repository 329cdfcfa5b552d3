//! credentials::file_store
//!
//! Encrypted file-based credential storage.
//!
//! # Security
//!
//! - Credentials are stored in `~/.gitsuper/credentials.enc`
//! - The whole credential map is encrypted with AES-256-GCM under a key
//!   derived (PBKDF2-HMAC-SHA256, 100k rounds) from machine-identifying
//!   material, so copying the file to another machine yields
//!   undecryptable data
//! - Directory permissions are 0700, file permissions 0600 on Unix;
//!   failure to set them is an error, not a warning
//! - All writes are atomic (write to temp file, then rename)
//! - Credential values are NEVER logged or included in error messages

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use pbkdf2::pbkdf2_hmac;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::warn;

use super::traits::{StorageBackend, StorageError};

/// PBKDF2 iteration count for the file key.
const KEY_DERIVATION_ROUNDS: u32 = 100_000;

/// Application salt for the file key derivation.
const KEY_DERIVATION_SALT: &[u8] = b"gitsuper-credential-store-v1";

/// AES-GCM nonce size in bytes.
const NONCE_BYTES: usize = 12;

/// On-disk envelope: a hex-encoded nonce and hex-encoded ciphertext
/// wrapping the JSON credential map.
#[derive(Serialize, Deserialize)]
struct EncryptedBlob {
    iv: String,
    data: String,
}

/// Encrypted file-based credential storage.
///
/// Stores all credential records in a single encrypted envelope. The
/// entire map is re-encrypted with a fresh nonce on every mutation.
pub struct EncryptedFileStore {
    /// Path to the encrypted credentials file
    path: PathBuf,
    /// AES-256 key, derived once at construction
    key: [u8; 32],
}

impl EncryptedFileStore {
    /// Create a store at the given path, keyed to this machine.
    pub fn at(path: PathBuf) -> Self {
        let key = derive_key(&machine_seed());
        Self { path, key }
    }

    /// Create a store with an explicit key.
    ///
    /// This is primarily useful for testing (e.g., simulating a file
    /// copied from another machine).
    pub fn with_key(path: PathBuf, key: [u8; 32]) -> Self {
        Self { path, key }
    }

    /// Get the path to the credentials file.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Read and decrypt the full credential map.
    fn read_entries(&self) -> Result<HashMap<String, serde_json::Value>, StorageError> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }

        let raw = fs::read_to_string(&self.path)
            .map_err(|e| StorageError::Read(format!("cannot read credentials file: {}", e)))?;

        let blob: EncryptedBlob = serde_json::from_str(&raw)
            .map_err(|e| StorageError::Read(format!("cannot parse credentials envelope: {}", e)))?;

        let nonce_bytes = hex::decode(&blob.iv)
            .map_err(|e| StorageError::Read(format!("invalid envelope iv: {}", e)))?;
        if nonce_bytes.len() != NONCE_BYTES {
            return Err(StorageError::Read(format!(
                "invalid envelope iv length: expected {}, got {}",
                NONCE_BYTES,
                nonce_bytes.len()
            )));
        }
        let ciphertext = hex::decode(&blob.data)
            .map_err(|e| StorageError::Read(format!("invalid envelope data: {}", e)))?;

        let cipher = Aes256Gcm::new_from_slice(&self.key)
            .map_err(|_| StorageError::Read("invalid key length".into()))?;
        let plaintext = cipher
            .decrypt(Nonce::from_slice(&nonce_bytes), ciphertext.as_ref())
            .map_err(|_| {
                StorageError::Read("cannot decrypt credentials file (wrong machine or corrupted)".into())
            })?;

        serde_json::from_slice(&plaintext)
            .map_err(|e| StorageError::Read(format!("cannot parse credential map: {}", e)))
    }

    /// Read the credential map for a mutation, recovering from corruption.
    ///
    /// A store that cannot be decrypted must not block storing new
    /// credentials, so corruption degrades to an empty map here.
    fn entries_for_update(&self) -> HashMap<String, serde_json::Value> {
        match self.read_entries() {
            Ok(entries) => entries,
            Err(e) => {
                warn!("discarding unreadable credentials file: {}", e);
                HashMap::new()
            }
        }
    }

    /// Encrypt and write the credential map with atomic rename.
    fn write_entries(
        &self,
        entries: &HashMap<String, serde_json::Value>,
    ) -> Result<(), StorageError> {
        let plaintext = serde_json::to_vec(entries)
            .map_err(|e| StorageError::Write(format!("cannot serialize credentials: {}", e)))?;

        let cipher = Aes256Gcm::new_from_slice(&self.key)
            .map_err(|_| StorageError::Write("invalid key length".into()))?;
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = cipher
            .encrypt(&nonce, plaintext.as_ref())
            .map_err(|_| StorageError::Write("encryption failed".into()))?;

        let blob = EncryptedBlob {
            iv: hex::encode(nonce),
            data: hex::encode(ciphertext),
        };
        let content = serde_json::to_string(&blob)
            .map_err(|e| StorageError::Write(format!("cannot serialize envelope: {}", e)))?;

        // Ensure the parent directory exists with owner-only access
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| StorageError::Write(format!("cannot create directory: {}", e)))?;

            #[cfg(unix)]
            {
                let permissions = fs::Permissions::from_mode(0o700);
                fs::set_permissions(parent, permissions).map_err(|e| {
                    StorageError::Permissions(format!("cannot set directory permissions: {}", e))
                })?;
            }
        }

        // Write to a temp file first for atomicity
        let temp_path = self.path.with_extension("tmp");

        {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)
                .map_err(|e| StorageError::Write(format!("cannot create temp file: {}", e)))?;

            // Set restrictive permissions BEFORE writing content (Unix only)
            #[cfg(unix)]
            {
                let permissions = fs::Permissions::from_mode(0o600);
                file.set_permissions(permissions).map_err(|e| {
                    StorageError::Permissions(format!("cannot set file permissions: {}", e))
                })?;
            }

            file.write_all(content.as_bytes())
                .map_err(|e| StorageError::Write(format!("cannot write credentials: {}", e)))?;

            file.sync_all()
                .map_err(|e| StorageError::Write(format!("cannot sync to disk: {}", e)))?;
        }

        // Atomic rename
        fs::rename(&temp_path, &self.path)
            .map_err(|e| StorageError::Write(format!("cannot rename temp file: {}", e)))?;

        Ok(())
    }
}

impl StorageBackend for EncryptedFileStore {
    fn get(&self, service: &str) -> Result<Option<String>, StorageError> {
        let entries = self.read_entries()?;
        Ok(entries.get(service).map(|value| value.to_string()))
    }

    fn set(&self, service: &str, value: &str) -> Result<(), StorageError> {
        let parsed = serde_json::from_str(value)
            .map_err(|e| StorageError::Write(format!("value is not valid JSON: {}", e)))?;

        let mut entries = self.entries_for_update();
        entries.insert(service.to_string(), parsed);
        self.write_entries(&entries)
    }

    fn delete(&self, service: &str) -> Result<(), StorageError> {
        if !self.path.exists() {
            return Ok(());
        }

        let mut entries = self.entries_for_update();
        entries.remove(service);
        self.write_entries(&entries)
    }
}

impl std::fmt::Debug for EncryptedFileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptedFileStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Derive the AES-256 file key from a seed string.
fn derive_key(seed: &str) -> [u8; 32] {
    let mut key = [0u8; 32];
    pbkdf2_hmac::<Sha256>(
        seed.as_bytes(),
        KEY_DERIVATION_SALT,
        KEY_DERIVATION_ROUNDS,
        &mut key,
    );
    key
}

/// Machine-identifying key seed: hostname plus home directory path.
///
/// This binds the ciphertext to the machine as a defense against casual
/// credential theft by file copy. It is not a defense against an attacker
/// with code execution on this machine.
fn machine_seed() -> String {
    let hostname = std::env::var("HOSTNAME")
        .or_else(|_| std::env::var("COMPUTERNAME"))
        .ok()
        .filter(|v| !v.trim().is_empty())
        .or_else(|| {
            fs::read_to_string("/etc/hostname")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        })
        .unwrap_or_else(|| "localhost".to_string());

    let home = dirs::home_dir()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default();

    format!("gitsuper|host={}|home={}", hostname, home)
}
