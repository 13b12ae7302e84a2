//! Storage configuration.
//!
//! `StorageConfig` is an immutable value type: it is built once by the host
//! (from whatever configuration surface it parses), validated, and then
//! handed to [`crate::VaultStorage::new`]. The engine never mutates it.

use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use url::Url;

use crate::error::{StorageError, StorageResult};

/// Default AppRole login path.
pub const DEFAULT_APPROLE_LOGIN_PATH: &str = "auth/approle/login";

/// Default token revocation path used on session close.
pub const DEFAULT_APPROLE_LOGOUT_PATH: &str = "auth/token/revoke-self";

/// Default key prefix under the secrets mount.
pub const DEFAULT_PATH_PREFIX: &str = "certificates";

/// Default staleness bound for lock records.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Default sleep between lock acquisition attempts.
pub const DEFAULT_LOCK_POLLING_INTERVAL: Duration = Duration::from_secs(5);

/// Default HTTP request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for a Vault-backed certificate store.
///
/// Exactly one authentication mode must be configured: a static token, or an
/// AppRole role id + secret id pair. Validation enforces this before the
/// engine is built.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Vault endpoint without any API version or path, e.g.
    /// `https://vault.example.org:8201`.
    pub endpoint: Url,
    /// Static Vault token. Lifecycle management of the token is up to the
    /// caller.
    pub token: Option<SecretString>,
    /// AppRole role id.
    pub approle_role_id: Option<SecretString>,
    /// AppRole secret id.
    pub approle_secret_id: Option<SecretString>,
    /// Login path for the AppRole exchange.
    pub approle_login_path: String,
    /// Revocation path used when closing a session with a leased token.
    pub approle_logout_path: String,
    /// Mount path of the KV v2 secrets engine, e.g. `secrets/production`.
    pub secrets_mount: String,
    /// Key prefix inside the mount under which certificate material lives.
    pub path_prefix: String,
    /// Skip TLS verification when talking to Vault.
    pub insecure_skip_verify: bool,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
    /// Age past which a lock record is considered abandoned and reclaimable.
    pub lock_timeout: Duration,
    /// Sleep between lock acquisition attempts.
    pub lock_polling_interval: Duration,
}

impl StorageConfig {
    /// Create a configuration for the given endpoint and secrets mount,
    /// with all other fields at their defaults. An auth mode must still be
    /// supplied via [`Self::with_token`] or [`Self::with_approle`].
    #[must_use]
    pub fn new(endpoint: Url, secrets_mount: impl Into<String>) -> Self {
        Self {
            endpoint,
            token: None,
            approle_role_id: None,
            approle_secret_id: None,
            approle_login_path: DEFAULT_APPROLE_LOGIN_PATH.to_string(),
            approle_logout_path: DEFAULT_APPROLE_LOGOUT_PATH.to_string(),
            secrets_mount: secrets_mount.into(),
            path_prefix: DEFAULT_PATH_PREFIX.to_string(),
            insecure_skip_verify: false,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            lock_polling_interval: DEFAULT_LOCK_POLLING_INTERVAL,
        }
    }

    /// Authenticate with a static token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(SecretString::from(token.into()));
        self
    }

    /// Authenticate via AppRole login.
    #[must_use]
    pub fn with_approle(mut self, role_id: impl Into<String>, secret_id: impl Into<String>) -> Self {
        self.approle_role_id = Some(SecretString::from(role_id.into()));
        self.approle_secret_id = Some(SecretString::from(secret_id.into()));
        self
    }

    /// Override the AppRole login and logout paths.
    #[must_use]
    pub fn with_approle_paths(
        mut self,
        login_path: impl Into<String>,
        logout_path: impl Into<String>,
    ) -> Self {
        self.approle_login_path = login_path.into();
        self.approle_logout_path = logout_path.into();
        self
    }

    /// Set the key prefix under the mount.
    #[must_use]
    pub fn with_path_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.path_prefix = prefix.into();
        self
    }

    /// Skip TLS verification when talking to Vault.
    #[must_use]
    pub const fn with_insecure_skip_verify(mut self, skip: bool) -> Self {
        self.insecure_skip_verify = skip;
        self
    }

    /// Set the per-request HTTP timeout.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the lock staleness bound.
    #[must_use]
    pub const fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Set the sleep between lock acquisition attempts.
    #[must_use]
    pub const fn with_lock_polling_interval(mut self, interval: Duration) -> Self {
        self.lock_polling_interval = interval;
        self
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidConfig`] if the mount path is empty or
    /// the auth fields do not describe exactly one authentication mode.
    pub fn validate(&self) -> StorageResult<()> {
        if self.secrets_mount.trim_matches('/').is_empty() {
            return Err(StorageError::invalid_config("secrets_mount is required"));
        }

        let has_token = self
            .token
            .as_ref()
            .is_some_and(|t| !t.expose_secret().is_empty());
        let has_role_id = self
            .approle_role_id
            .as_ref()
            .is_some_and(|r| !r.expose_secret().is_empty());
        let has_secret_id = self
            .approle_secret_id
            .as_ref()
            .is_some_and(|s| !s.expose_secret().is_empty());

        match (has_token, has_role_id, has_secret_id) {
            (true, false, false) | (false, true, true) => Ok(()),
            (false, false, false) => Err(StorageError::invalid_config(
                "you must configure 'token' or 'approle_role_id' + 'approle_secret_id' to authenticate with Vault",
            )),
            (false, ..) => Err(StorageError::invalid_config(
                "approle authentication requires both 'approle_role_id' and 'approle_secret_id'",
            )),
            (true, ..) => Err(StorageError::invalid_config(
                "configure either 'token' or approle credentials, not both",
            )),
        }
    }
}
