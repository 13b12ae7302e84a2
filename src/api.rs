//! Vault KV v2 and auth wire types.
//!
//! Only the response fields the engine actually consumes are declared;
//! everything else in Vault's envelopes is ignored during deserialization.

use serde::Deserialize;

/// Header Vault expects the client token in.
pub const VAULT_TOKEN_HEADER: &str = "X-Vault-Token";

/// KV v2 read response envelope.
#[derive(Debug, Deserialize)]
pub struct KvReadResponse {
    /// Outer `data` object of the envelope.
    pub data: KvReadData,
}

/// Inner payload + version metadata of a KV v2 read.
#[derive(Debug, Deserialize)]
pub struct KvReadData {
    /// The stored key/value map.
    pub data: KvPayload,
    /// Metadata of the version that was read.
    pub metadata: KvVersionMetadata,
}

/// Shape of the stored secret data.
///
/// Certificate material is opaque bytes, carried base64-encoded in a single
/// `value` field so arbitrary payloads survive JSON transport.
#[derive(Debug, Deserialize)]
pub struct KvPayload {
    /// Base64-encoded payload bytes.
    pub value: String,
}

/// Version metadata attached to a KV v2 read.
#[derive(Debug, Deserialize)]
pub struct KvVersionMetadata {
    /// RFC 3339 creation time of this version.
    pub created_time: String,
    /// Version number.
    pub version: u64,
}

/// KV v2 list response envelope.
#[derive(Debug, Deserialize)]
pub struct KvListResponse {
    /// Outer `data` object of the envelope.
    pub data: KvListData,
}

/// Child names under a listed path. Directory children carry a trailing `/`.
#[derive(Debug, Deserialize)]
pub struct KvListData {
    /// Immediate child names.
    pub keys: Vec<String>,
}

/// Login response envelope.
#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    /// The `auth` block carrying the leased token.
    pub auth: AuthData,
}

/// Leased token details from a login exchange.
#[derive(Debug, Deserialize)]
pub struct AuthData {
    /// The client token to present on subsequent calls.
    pub client_token: String,
    /// Lease validity in seconds.
    pub lease_duration: u64,
    /// Whether the lease can be renewed.
    pub renewable: bool,
}

/// Error envelope Vault attaches to non-2xx responses.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error strings.
    #[serde(default)]
    pub errors: Vec<String>,
}
