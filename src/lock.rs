//! Distributed locking over the storage engine.
//!
//! A lock is a reserved child entry `<key>/.lock` holding a [`LockRecord`],
//! created with a conditional write so only one instance can win an empty
//! slot. Liveness under crash comes from staleness: a record older than the
//! configured lock timeout is presumed abandoned and reclaimed. Mutual
//! exclusion is therefore not strict — a slow holder and a reclaimer can
//! briefly overlap — which is acceptable for certificate renewal, itself
//! idempotent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::engine::{VaultStorage, payload_data};
use crate::error::{StorageError, StorageResult};

/// Reserved leaf name for lock entries.
pub(crate) const LOCK_LEAF: &str = ".lock";

/// Contents of a lock entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockRecord {
    /// The logical key this lock protects.
    pub key: String,
    /// Identifier of the acquiring instance, fresh per acquisition.
    pub owner: Uuid,
    /// When the lock was acquired.
    pub acquired: DateTime<Utc>,
}

impl LockRecord {
    fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            owner: Uuid::new_v4(),
            acquired: Utc::now(),
        }
    }

    /// Whether this record is older than `timeout` and therefore presumed
    /// abandoned by a crashed holder.
    #[must_use]
    pub fn is_stale(&self, timeout: Duration) -> bool {
        let age = Utc::now().signed_duration_since(self.acquired);
        age > chrono::Duration::from_std(timeout).unwrap_or(chrono::Duration::MAX)
    }
}

impl VaultStorage {
    /// Acquire the cross-instance lock for `key`.
    ///
    /// Polls at the configured interval until the slot is free or its
    /// current record goes stale. There is no internal attempt bound; a
    /// caller that wants to give up earlier drops the future or uses
    /// [`Self::lock_with_timeout`].
    #[instrument(skip(self))]
    pub async fn lock(&self, key: &str) -> StorageResult<()> {
        let lock_key = lock_key(key);
        let data_path = self.paths.data_path(&lock_key);

        loop {
            let record = LockRecord::new(key);
            let body = serde_json::to_vec(&record)?;

            if self
                .client
                .put_json_if_absent(&data_path, payload_data(&body))
                .await?
            {
                debug!(key, owner = %record.owner, "acquired lock");
                return Ok(());
            }

            match self.load(&lock_key).await {
                Ok(current) => match serde_json::from_slice::<LockRecord>(&current) {
                    Ok(holder) if holder.is_stale(self.config.lock_timeout) => {
                        self.store(&lock_key, &body).await?;
                        info!(key, previous_owner = %holder.owner, owner = %record.owner,
                            "reclaimed stale lock");
                        return Ok(());
                    }
                    Ok(holder) => {
                        debug!(key, holder = %holder.owner, "lock held, polling");
                    }
                    Err(error) => {
                        // An unreadable record would block the key forever;
                        // treat it like a crashed holder.
                        warn!(key, %error, "unparseable lock record, reclaiming");
                        self.store(&lock_key, &body).await?;
                        return Ok(());
                    }
                },
                // Released between our create attempt and the read; try
                // again immediately.
                Err(error) if error.is_not_found() => continue,
                Err(error) => return Err(error),
            }

            tokio::time::sleep(self.config.lock_polling_interval).await;
        }
    }

    /// Acquire the lock for `key`, waiting at most `wait`.
    ///
    /// # Errors
    ///
    /// [`StorageError::LockTimeout`] if the lock was not acquired in time.
    pub async fn lock_with_timeout(&self, key: &str, wait: Duration) -> StorageResult<()> {
        tokio::time::timeout(wait, self.lock(key))
            .await
            .map_err(|_| StorageError::LockTimeout(key.to_string()))?
    }

    /// Release the lock for `key`.
    ///
    /// Deletes by path without verifying ownership; releasing an absent or
    /// already-reclaimed lock succeeds, since the caller's hold is over
    /// either way.
    pub async fn unlock(&self, key: &str) -> StorageResult<()> {
        self.delete(&lock_key(key)).await?;
        debug!(key, "released lock");
        Ok(())
    }
}

fn lock_key(key: &str) -> String {
    format!("{}/{}", key.trim_matches('/'), LOCK_LEAF)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_key_placement() {
        assert_eq!(lock_key("foo.bar.com"), "foo.bar.com/.lock");
        assert_eq!(lock_key("staging/foo/"), "staging/foo/.lock");
    }

    #[test]
    fn test_fresh_record_is_not_stale() {
        let record = LockRecord::new("foo");
        assert!(!record.is_stale(Duration::from_secs(300)));
    }

    #[test]
    fn test_old_record_is_stale() {
        let mut record = LockRecord::new("foo");
        record.acquired = Utc::now() - chrono::Duration::seconds(301);
        assert!(record.is_stale(Duration::from_secs(300)));
    }

    #[test]
    fn test_record_round_trip() {
        let record = LockRecord::new("foo.bar.com");
        let bytes = serde_json::to_vec(&record).unwrap();
        let parsed: LockRecord = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed.key, "foo.bar.com");
        assert_eq!(parsed.owner, record.owner);
    }
}
