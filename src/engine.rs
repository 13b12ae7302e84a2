//! The Vault-backed storage engine.
//!
//! Implements the file-system-like contract on top of the KV v2 API:
//! payloads live under `data/`, existence and deletion go through
//! `metadata/`, and listing walks the metadata tree. Nothing is cached
//! locally; every operation round-trips to Vault.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::api::KvReadResponse;
use crate::auth::AuthSession;
use crate::client::RemoteClient;
use crate::config::StorageConfig;
use crate::error::StorageResult;
use crate::lock::LOCK_LEAF;
use crate::paths::PathMapper;
use crate::provider::{KeyStat, Storage};

/// Storage engine speaking to a single Vault KV v2 mount.
///
/// Cheap to share behind an `Arc`; all methods take `&self` and the only
/// in-process mutable state is the cached auth credential inside the
/// session.
#[derive(Debug)]
pub struct VaultStorage {
    pub(crate) config: StorageConfig,
    pub(crate) paths: PathMapper,
    pub(crate) client: RemoteClient,
}

impl VaultStorage {
    /// Build an engine from a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StorageError::InvalidConfig`] for an unusable
    /// configuration, or an HTTP error if the TLS client cannot be built.
    /// A failed construction leaves nothing to clean up.
    pub fn new(config: StorageConfig) -> StorageResult<Self> {
        config.validate()?;

        let mut builder = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .use_rustls_tls();
        if config.insecure_skip_verify {
            builder = builder.danger_accept_invalid_certs(true);
        }
        let http = builder.build()?;

        let session = AuthSession::new(&config, http.clone())?;
        let client = RemoteClient::new(&config.endpoint, http, session);
        let paths = PathMapper::new(&config.secrets_mount, &config.path_prefix);

        Ok(Self {
            config,
            paths,
            client,
        })
    }

    /// Write `value` at `key`, overwriting unconditionally. The remote
    /// store's own versioning is not exposed; the engine is
    /// last-writer-wins.
    pub async fn store(&self, key: &str, value: &[u8]) -> StorageResult<()> {
        let path = self.paths.data_path(key);
        let body = serde_json::json!({ "data": payload_data(value) });
        self.client.put_json(&path, body).await?;
        debug!(key, bytes = value.len(), "stored entry");
        Ok(())
    }

    /// Read the payload at `key`.
    pub async fn load(&self, key: &str) -> StorageResult<Vec<u8>> {
        let path = self.paths.data_path(key);
        let response: KvReadResponse = self.client.get_json(&path, key).await?;
        Ok(BASE64.decode(response.data.data.value)?)
    }

    /// Remove `key` and all its versions. Idempotent: deleting an absent
    /// key succeeds, mirroring Vault's own answer for absent metadata.
    pub async fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.paths.metadata_path(key);
        self.client.delete(&path).await?;
        debug!(key, "deleted entry");
        Ok(())
    }

    /// Whether `key` currently holds a payload, as a metadata probe.
    /// A missing key is `false`, never an error; so is any failure to
    /// reach Vault.
    pub async fn exists(&self, key: &str) -> bool {
        let path = self.paths.metadata_path(key);
        self.client.probe(&path).await.unwrap_or(false)
    }

    /// Describe `key`: modification time and size for terminal keys, a
    /// bare non-terminal marker for keys that only exist as a directory
    /// prefix.
    pub async fn stat(&self, key: &str) -> StorageResult<KeyStat> {
        let path = self.paths.data_path(key);
        match self.client.get_json::<KvReadResponse>(&path, key).await {
            Ok(response) => {
                let payload = BASE64.decode(response.data.data.value)?;
                Ok(KeyStat {
                    key: key.to_string(),
                    modified: parse_modified(&response.data.metadata.created_time),
                    size: payload.len() as u64,
                    is_terminal: true,
                })
            }
            Err(error) if error.is_not_found() => {
                // No payload of its own; it may still exist as a directory.
                let children = self.client.list(&self.paths.list_path(key), key).await?;
                if children.is_empty() {
                    return Err(error);
                }
                Ok(KeyStat {
                    key: key.to_string(),
                    modified: None,
                    size: 0,
                    is_terminal: false,
                })
            }
            Err(error) => Err(error),
        }
    }

    /// Enumerate terminal keys under `prefix`.
    ///
    /// Non-recursive returns only the immediate terminal children;
    /// recursive walks every directory child depth-first and accumulates
    /// all terminal descendants. Either way the result is the full
    /// prefix-qualified key set, lexicographically sorted as one sequence.
    /// A prefix with no children at all is [`crate::StorageError::NotFound`].
    pub async fn list(&self, prefix: &str, recursive: bool) -> StorageResult<Vec<String>> {
        let root = prefix.trim_matches('/').to_string();
        let mut pending = vec![root.clone()];
        let mut keys = Vec::new();

        while let Some(dir) = pending.pop() {
            let children = match self.client.list(&self.paths.list_path(&dir), &dir).await {
                Ok(children) => children,
                // A subdirectory observed earlier can vanish mid-walk if
                // another instance deletes its last entry; only the root
                // prefix itself is required to exist.
                Err(error) if error.is_not_found() && dir != root => continue,
                Err(error) => return Err(error),
            };

            for child in children {
                if let Some(name) = child.strip_suffix('/') {
                    if recursive {
                        pending.push(join_key(&dir, name));
                    }
                } else if child != LOCK_LEAF {
                    keys.push(join_key(&dir, &child));
                }
            }
        }

        keys.sort_unstable();
        debug!(prefix, recursive, count = keys.len(), "listed keys");
        Ok(keys)
    }

    /// Revoke the session's leased credential, if it holds one.
    /// Best-effort and idempotent.
    pub async fn close(&self) {
        self.client.session().close().await;
    }
}

#[async_trait]
impl Storage for VaultStorage {
    async fn store(&self, key: &str, value: &[u8]) -> StorageResult<()> {
        Self::store(self, key, value).await
    }

    async fn load(&self, key: &str) -> StorageResult<Vec<u8>> {
        Self::load(self, key).await
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        Self::delete(self, key).await
    }

    async fn exists(&self, key: &str) -> bool {
        Self::exists(self, key).await
    }

    async fn stat(&self, key: &str) -> StorageResult<KeyStat> {
        Self::stat(self, key).await
    }

    async fn list(&self, prefix: &str, recursive: bool) -> StorageResult<Vec<String>> {
        Self::list(self, prefix, recursive).await
    }

    async fn lock(&self, key: &str) -> StorageResult<()> {
        Self::lock(self, key).await
    }

    async fn unlock(&self, key: &str) -> StorageResult<()> {
        Self::unlock(self, key).await
    }
}

/// KV v2 data map carrying an opaque byte payload.
pub(crate) fn payload_data(value: &[u8]) -> serde_json::Value {
    serde_json::json!({ "value": BASE64.encode(value) })
}

fn parse_modified(created_time: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(created_time)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

fn join_key(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}
