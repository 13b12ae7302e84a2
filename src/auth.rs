//! Authentication session management.
//!
//! Two modes: a static token owned by the caller, or an AppRole login that
//! yields a short-lived leased token. Leased tokens are cached for their
//! lifetime minus a renewal skew so they can be reused across storage
//! operations, and refreshed with a single login no matter how many callers
//! discover the expiry at once.

use secrecy::{ExposeSecret, SecretString};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::api::{AuthResponse, VAULT_TOKEN_HEADER};
use crate::config::StorageConfig;
use crate::error::{StorageError, StorageResult};

/// Leased credentials are refreshed this long before their actual expiry,
/// so a token handed to a long-running operation (a lock poll loop, say)
/// does not die mid-operation.
pub const RENEWAL_SKEW: Duration = Duration::from_secs(5 * 60);

/// The credential presented to Vault on a call.
#[derive(Debug, Clone)]
pub enum AuthCredential {
    /// Fixed token, lifecycle managed by the caller.
    Static(SecretString),
    /// Short-lived token obtained via AppRole login.
    Leased {
        /// The leased client token.
        token: SecretString,
        /// When the login exchange completed.
        issued_at: Instant,
        /// Validity window granted by Vault.
        lease: Duration,
        /// Whether Vault would allow renewal. Kept for observability; the
        /// session re-logs-in rather than renewing.
        renewable: bool,
    },
}

impl AuthCredential {
    /// The token to present in the [`VAULT_TOKEN_HEADER`] header.
    #[must_use]
    pub const fn token(&self) -> &SecretString {
        match self {
            Self::Static(token) | Self::Leased { token, .. } => token,
        }
    }

    /// A leased credential is expired once it enters the renewal skew
    /// window. Static credentials never expire on their own.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        match self {
            Self::Static(_) => false,
            Self::Leased {
                issued_at, lease, ..
            } => issued_at.elapsed() >= lease.saturating_sub(RENEWAL_SKEW),
        }
    }
}

#[derive(Debug)]
enum AuthMode {
    Static(SecretString),
    AppRole {
        role_id: SecretString,
        secret_id: SecretString,
        login_path: String,
        logout_path: String,
    },
}

/// Owns the credential used to authenticate remote calls.
///
/// All cache access goes through one async mutex which is held for the
/// duration of a login exchange, so concurrent refreshes coalesce into a
/// single call and every waiter observes the same credential or error.
#[derive(Debug)]
pub struct AuthSession {
    mode: AuthMode,
    http: reqwest::Client,
    base_url: String,
    cached: Mutex<Option<AuthCredential>>,
}

impl AuthSession {
    /// Build a session from a validated configuration and a shared HTTP
    /// client.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidConfig`] if no authentication mode is
    /// present (callers are expected to have run
    /// [`StorageConfig::validate`] first).
    pub fn new(config: &StorageConfig, http: reqwest::Client) -> StorageResult<Self> {
        let mode = if let Some(token) = config.token.clone() {
            AuthMode::Static(token)
        } else if let (Some(role_id), Some(secret_id)) = (
            config.approle_role_id.clone(),
            config.approle_secret_id.clone(),
        ) {
            AuthMode::AppRole {
                role_id,
                secret_id,
                login_path: config.approle_login_path.clone(),
                logout_path: config.approle_logout_path.clone(),
            }
        } else {
            return Err(StorageError::invalid_config(
                "no usable credential configured",
            ));
        };

        Ok(Self {
            mode,
            http,
            base_url: config.endpoint.as_str().trim_end_matches('/').to_string(),
            cached: Mutex::new(None),
        })
    }

    /// The credential to use for the next remote call, performing a login
    /// exchange if the cached lease is missing or inside the renewal skew.
    ///
    /// # Errors
    ///
    /// [`StorageError::AuthFailed`] if Vault rejects the login,
    /// [`StorageError::Network`] on transport failure.
    pub async fn credential(&self) -> StorageResult<AuthCredential> {
        match &self.mode {
            AuthMode::Static(token) => Ok(AuthCredential::Static(token.clone())),
            AuthMode::AppRole {
                role_id,
                secret_id,
                login_path,
                ..
            } => {
                let mut cached = self.cached.lock().await;
                if let Some(credential) = cached.as_ref() {
                    if !credential.is_expired() {
                        return Ok(credential.clone());
                    }
                    debug!("cached vault token entered renewal window, logging in again");
                }

                let credential = self.login(role_id, secret_id, login_path).await?;
                *cached = Some(credential.clone());
                Ok(credential)
            }
        }
    }

    #[instrument(skip_all, fields(path = %login_path))]
    async fn login(
        &self,
        role_id: &SecretString,
        secret_id: &SecretString,
        login_path: &str,
    ) -> StorageResult<AuthCredential> {
        let url = format!("{}/v1/{}", self.base_url, login_path.trim_matches('/'));
        let body = serde_json::json!({
            "role_id": role_id.expose_secret(),
            "secret_id": secret_id.expose_secret(),
        });

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| StorageError::network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            if status.is_client_error() {
                return Err(StorageError::auth_failed(format!("status {status}: {text}")));
            }
            return Err(StorageError::network(format!("status {status}: {text}")));
        }

        let auth: AuthResponse = response.json().await?;
        let lease = Duration::from_secs(auth.auth.lease_duration);
        info!(lease_secs = lease.as_secs(), "logged in to vault via approle");

        Ok(AuthCredential::Leased {
            token: SecretString::from(auth.auth.client_token),
            issued_at: Instant::now(),
            lease,
            renewable: auth.auth.renewable,
        })
    }

    /// Revoke a cached leased token, if any. Best-effort: revocation
    /// failures are logged and swallowed so teardown never blocks on Vault.
    /// Idempotent; a no-op for static tokens.
    pub async fn close(&self) {
        let AuthMode::AppRole { logout_path, .. } = &self.mode else {
            return;
        };

        let Some(credential) = self.cached.lock().await.take() else {
            return;
        };

        let url = format!("{}/v1/{}", self.base_url, logout_path.trim_matches('/'));
        let result = self
            .http
            .post(&url)
            .header(VAULT_TOKEN_HEADER, credential.token().expose_secret())
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                debug!("revoked leased vault token");
            }
            Ok(response) => {
                warn!(status = %response.status(), "failed to revoke leased vault token");
            }
            Err(error) => {
                warn!(%error, "failed to revoke leased vault token");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;
    use url::Url;

    fn leased(age: Duration, lease: Duration) -> AuthCredential {
        let issued_at = Instant::now().checked_sub(age).unwrap_or_else(Instant::now);
        AuthCredential::Leased {
            token: SecretString::from("hvs.token".to_string()),
            issued_at,
            lease,
            renewable: true,
        }
    }

    #[test]
    fn test_static_never_expires() {
        let credential = AuthCredential::Static(SecretString::from("s.token".to_string()));
        assert!(!credential.is_expired());
    }

    #[test]
    fn test_fresh_lease_is_usable() {
        let credential = leased(Duration::ZERO, Duration::from_secs(3600));
        assert!(!credential.is_expired());
    }

    #[test]
    fn test_lease_expires_at_skew_boundary() {
        // 1h lease, 56m old: inside the 5m skew window.
        let credential = leased(Duration::from_secs(56 * 60), Duration::from_secs(3600));
        assert!(credential.is_expired());
    }

    #[test]
    fn test_short_lease_is_always_inside_skew() {
        let credential = leased(Duration::ZERO, Duration::from_secs(30));
        assert!(credential.is_expired());
    }

    #[test]
    fn test_static_session_never_hits_the_network() {
        let config = StorageConfig::new(
            Url::parse("http://127.0.0.1:8200").unwrap(),
            "secrets",
        )
        .with_token("s.fixed");
        let session = AuthSession::new(&config, reqwest::Client::new()).unwrap();

        let credential = tokio_test::block_on(session.credential()).unwrap();
        assert_eq!(credential.token().expose_secret(), "s.fixed");
        assert!(!credential.is_expired());

        // Close is a no-op without a leased token.
        tokio_test::block_on(session.close());
    }

    #[test]
    fn test_session_requires_a_mode() {
        let config = StorageConfig::new(
            Url::parse("http://127.0.0.1:8200").unwrap(),
            "secrets",
        );
        assert!(AuthSession::new(&config, reqwest::Client::new()).is_err());
    }

    #[test]
    fn test_credential_debug_is_redacted() {
        let credential = leased(Duration::ZERO, Duration::from_secs(3600));
        let debug = format!("{credential:?}");
        assert!(!debug.contains("hvs.token"));
    }
}
