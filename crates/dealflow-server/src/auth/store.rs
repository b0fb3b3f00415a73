//! Pending-credential storage.
//!
//! [`CredentialStore`] is the seam for swapping the process-local map for an
//! external store. Consumption goes through [`CredentialStore::mark_used`],
//! a compare-and-set, so two concurrent verifications of the same secret can
//! never both succeed.

use super::credential::PendingCredential;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("credential store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn get(&self, identity: &str) -> Result<Option<PendingCredential>, StoreError>;

    /// Insert or overwrite the credential for `identity`.
    async fn put(&self, identity: &str, credential: PendingCredential) -> Result<(), StoreError>;

    /// Remove the credential for `identity`, returning whether one existed.
    async fn delete(&self, identity: &str) -> Result<bool, StoreError>;

    /// Set `used` on the stored credential if it still carries `secret_hash`
    /// and is unused. Returns whether this call performed the transition.
    async fn mark_used(&self, identity: &str, secret_hash: &str) -> Result<bool, StoreError>;

    /// Drop every unused credential that is expired at `now`, returning the
    /// count. Used credentials stay until the identity is reissued, so a
    /// replayed link keeps reporting "already used".
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, StoreError>;
}

/// Process-local store; lives as long as the server
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    entries: DashMap<String, PendingCredential>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn get(&self, identity: &str) -> Result<Option<PendingCredential>, StoreError> {
        Ok(self.entries.get(identity).map(|entry| entry.value().clone()))
    }

    async fn put(&self, identity: &str, credential: PendingCredential) -> Result<(), StoreError> {
        self.entries.insert(identity.to_string(), credential);
        Ok(())
    }

    async fn delete(&self, identity: &str) -> Result<bool, StoreError> {
        Ok(self.entries.remove(identity).is_some())
    }

    async fn mark_used(&self, identity: &str, secret_hash: &str) -> Result<bool, StoreError> {
        // get_mut holds the shard write lock for the whole check-and-set.
        let Some(mut entry) = self.entries.get_mut(identity) else {
            return Ok(false);
        };
        if entry.used || entry.secret_hash != secret_hash {
            return Ok(false);
        }
        entry.used = true;
        Ok(true)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let before = self.entries.len();
        self.entries
            .retain(|_, credential| credential.used || !credential.is_expired(now));
        Ok(before.saturating_sub(self.entries.len()))
    }
}
