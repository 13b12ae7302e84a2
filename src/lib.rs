//! Vault-backed storage and locking for automatic TLS certificate managers.
//!
//! Persists certificate material in a KV v2 secrets engine and coordinates
//! issuance/renewal across cooperating server processes with a distributed
//! lock. The host-facing surface is the [`Storage`] trait; [`VaultStorage`]
//! is the engine behind it.
//!
//! ```no_run
//! use vault_cert_storage::{StorageConfig, VaultStorage};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = StorageConfig::new(
//!         "https://vault.example.org:8201".parse()?,
//!         "secrets/production",
//!     )
//!     .with_approle("role-id", "secret-id");
//!
//!     let storage = VaultStorage::new(config)?;
//!
//!     storage.lock("example.com").await?;
//!     storage
//!         .store("example.com/example.com.crt", b"-----BEGIN CERTIFICATE-----")
//!         .await?;
//!     storage.unlock("example.com").await?;
//!
//!     storage.close().await;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
mod client;
pub mod config;
pub mod engine;
pub mod error;
pub mod lock;
pub mod paths;
pub mod provider;

pub use auth::{AuthCredential, AuthSession};
pub use config::StorageConfig;
pub use engine::VaultStorage;
pub use error::{StorageError, StorageResult};
pub use lock::LockRecord;
pub use paths::PathMapper;
pub use provider::{KeyStat, Storage};
