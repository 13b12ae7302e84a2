//! Host-facing storage contract.
//!
//! The certificate manager depends on exactly this surface: a file-system-
//! like key/value contract plus a cross-instance lock. [`crate::VaultStorage`]
//! is the Vault-backed implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StorageResult;

/// Metadata about a stored key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyStat {
    /// The logical key this describes.
    pub key: String,
    /// When the current version was written. `None` for keys that exist
    /// only as a directory prefix.
    pub modified: Option<DateTime<Utc>>,
    /// Decoded payload size in bytes. Zero for directory prefixes.
    pub size: u64,
    /// True if the key carries its own payload, false if it exists only
    /// because keys are nested beneath it.
    pub is_terminal: bool,
}

/// Durable, shared storage with cross-instance locking.
///
/// Keys are slash-delimited, case-sensitive, without a leading slash.
/// There is no ordering guarantee between concurrent `store` calls to the
/// same key; callers wanting atomic read-modify-write must hold the key's
/// lock across the sequence.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Write `value` at `key`, overwriting unconditionally.
    async fn store(&self, key: &str, value: &[u8]) -> StorageResult<()>;

    /// Read the payload at `key`.
    async fn load(&self, key: &str) -> StorageResult<Vec<u8>>;

    /// Remove `key` and all its versions. Deleting an absent key succeeds.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Whether `key` currently holds a payload. Never errors; a missing key
    /// (or any failure probing it) reads as `false`.
    async fn exists(&self, key: &str) -> bool;

    /// Describe `key`.
    async fn stat(&self, key: &str) -> StorageResult<KeyStat>;

    /// Enumerate terminal keys under `prefix`, lexicographically sorted,
    /// prefix-qualified. Non-recursive returns only immediate terminal
    /// children; recursive returns every terminal descendant.
    async fn list(&self, prefix: &str, recursive: bool) -> StorageResult<Vec<String>>;

    /// Acquire the cross-instance lock for `key`, polling until it is
    /// available or the record left by a crashed holder goes stale. Give up
    /// early by dropping the future.
    async fn lock(&self, key: &str) -> StorageResult<()>;

    /// Release the lock for `key`. Best-effort; releasing a lock that is
    /// absent or was reclaimed by another instance is not an error.
    async fn unlock(&self, key: &str) -> StorageResult<()>;
}
