//! Thin request executor against the Vault HTTP API.
//!
//! Owns the status-code mapping contract: 404 becomes [`StorageError::NotFound`],
//! 401/403 become [`StorageError::AuthFailed`], everything else non-2xx is a
//! [`StorageError::Network`]. Nothing here retries; retry decisions belong to
//! the lock poll loop alone.

use reqwest::{Method, Response, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::api::{ErrorResponse, VAULT_TOKEN_HEADER};
use crate::auth::AuthSession;
use crate::error::{StorageError, StorageResult};

/// Marker Vault puts in the error body when a check-and-set write loses.
const CAS_MISMATCH: &str = "check-and-set parameter did not match";

#[derive(Debug)]
pub(crate) struct RemoteClient {
    http: reqwest::Client,
    base_url: String,
    session: AuthSession,
}

impl RemoteClient {
    pub(crate) fn new(endpoint: &url::Url, http: reqwest::Client, session: AuthSession) -> Self {
        Self {
            http,
            base_url: endpoint.as_str().trim_end_matches('/').to_string(),
            session,
        }
    }

    pub(crate) const fn session(&self) -> &AuthSession {
        &self.session
    }

    /// GET a JSON document. `key` is the logical key reported on 404.
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        key: &str,
    ) -> StorageResult<T> {
        let response = self.send(Method::GET, path, None, false).await?;
        match response.status() {
            status if status.is_success() => Ok(response.json().await?),
            StatusCode::NOT_FOUND => Err(StorageError::not_found(key)),
            status => Err(Self::map_failure(status, response).await),
        }
    }

    /// Write a JSON document, overwriting whatever is there.
    pub(crate) async fn put_json(&self, path: &str, body: serde_json::Value) -> StorageResult<()> {
        let response = self.send(Method::POST, path, Some(body), false).await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        Err(Self::map_failure(status, response).await)
    }

    /// Write a JSON document only if no version exists at `path` yet.
    /// Returns `false` when the conditional create lost to an existing
    /// version.
    pub(crate) async fn put_json_if_absent(
        &self,
        path: &str,
        data: serde_json::Value,
    ) -> StorageResult<bool> {
        let body = serde_json::json!({
            "data": data,
            "options": { "cas": 0 },
        });
        let response = self.send(Method::POST, path, Some(body), false).await?;
        let status = response.status();
        if status.is_success() {
            return Ok(true);
        }

        if status == StatusCode::BAD_REQUEST {
            let envelope: ErrorResponse = response.json().await.unwrap_or(ErrorResponse {
                errors: Vec::new(),
            });
            if envelope.errors.iter().any(|e| e.contains(CAS_MISMATCH)) {
                debug!(path, "conditional create lost, entry already present");
                return Ok(false);
            }
            return Err(StorageError::network(format!(
                "status {status}: {}",
                envelope.errors.join("; ")
            )));
        }

        Err(Self::map_failure(status, response).await)
    }

    /// DELETE a path. Absent targets are not an error; Vault itself answers
    /// 2xx when deleting metadata that is not there.
    pub(crate) async fn delete(&self, path: &str) -> StorageResult<()> {
        let response = self.send(Method::DELETE, path, None, false).await?;
        let status = response.status();
        if status.is_success() || status == StatusCode::NOT_FOUND {
            return Ok(());
        }
        Err(Self::map_failure(status, response).await)
    }

    /// Whether a document exists at `path`. Only transport and auth
    /// failures surface as errors.
    pub(crate) async fn probe(&self, path: &str) -> StorageResult<bool> {
        let response = self.send(Method::GET, path, None, false).await?;
        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(Self::map_failure(status, response).await),
        }
    }

    /// Enumerate the immediate child names of `path`. `prefix` is the
    /// logical prefix reported on 404.
    pub(crate) async fn list(&self, path: &str, prefix: &str) -> StorageResult<Vec<String>> {
        let response = self.send(Method::GET, path, None, true).await?;
        match response.status() {
            status if status.is_success() => {
                let parsed: crate::api::KvListResponse = response.json().await?;
                Ok(parsed.data.keys)
            }
            StatusCode::NOT_FOUND => Err(StorageError::not_found(prefix)),
            status => Err(Self::map_failure(status, response).await),
        }
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
        list: bool,
    ) -> StorageResult<Response> {
        let credential = self.session.credential().await?;
        let url = format!("{}/v1/{}", self.base_url, path);

        let mut request = self
            .http
            .request(method, &url)
            .header(VAULT_TOKEN_HEADER, credential.token().expose_secret());
        if list {
            request = request.query(&[("list", "true")]);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        request
            .send()
            .await
            .map_err(|e| StorageError::network(e.to_string()))
    }

    async fn map_failure(status: StatusCode, response: Response) -> StorageError {
        let text = response.text().await.unwrap_or_default();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                StorageError::auth_failed(format!("status {status}: {text}"))
            }
            _ => StorageError::network(format!("status {status}: {text}")),
        }
    }
}
