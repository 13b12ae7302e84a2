//! Storage error types using thiserror 2.0.
//!
//! Every remote failure is folded into a small taxonomy so callers can
//! distinguish "the key is not there" from "Vault rejected our credential"
//! from "the network ate the request".

use thiserror::Error;

/// Errors surfaced by the storage engine and lock manager.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Key or metadata absent in the secrets engine
    #[error("key not found: {0}")]
    NotFound(String),

    /// Login rejected or credential refused by Vault
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// Transport failure or unexpected response from Vault
    #[error("vault unavailable: {0}")]
    Network(String),

    /// HTTP client error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Stored payload was not valid base64
    #[error("payload decoding error: {0}")]
    Decode(#[from] base64::DecodeError),

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Lock not acquired within the caller's allowed wait
    #[error("timed out acquiring lock for key: {0}")]
    LockTimeout(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

impl StorageError {
    /// Check if error is a normal missing-key outcome.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if error is a transient transport failure.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Http(_))
    }

    /// Create a not-found error for the given key.
    #[must_use]
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound(key.into())
    }

    /// Create an authentication failure.
    #[must_use]
    pub fn auth_failed(msg: impl Into<String>) -> Self {
        Self::AuthFailed(msg.into())
    }

    /// Create a network error.
    #[must_use]
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create an invalid-configuration error.
    #[must_use]
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
