//! Magic-link issuance and verification.
//!
//! Issuing stores `{hash, expires_at, used = false}` under the identity and
//! hands the plaintext secret back for delivery. Verifying checks, in order:
//! existence, used flag, expiry, then the hash. The session token is
//! minted before the credential is consumed, so a failure there leaves the
//! link usable.

use super::credential::{generate_secret, CredentialHasher, HashError, PendingCredential};
use super::store::{CredentialStore, StoreError};
use super::token::{SessionTokenCodec, TokenError};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("Email not found or login link not requested")]
    NotFound,

    #[error("This login link has already been used")]
    AlreadyUsed,

    #[error("This login link has expired")]
    Expired,

    #[error("Invalid login link")]
    Mismatch,

    #[error("Magic link lifetime is out of range")]
    LifetimeOutOfRange,

    #[error(transparent)]
    Hashing(#[from] HashError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Token(#[from] TokenError),
}

/// A freshly issued magic link
#[derive(Debug, Clone)]
pub struct IssuedCredential {
    /// Plaintext secret; goes into the link and nowhere else
    pub secret: String,
    pub expires_at: DateTime<Utc>,
}

pub struct MagicLinkService {
    store: Arc<dyn CredentialStore>,
    hasher: CredentialHasher,
    tokens: Arc<SessionTokenCodec>,
    credential_ttl: Duration,
    token_ttl: Duration,
}

impl MagicLinkService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        hasher: CredentialHasher,
        tokens: Arc<SessionTokenCodec>,
        credential_ttl: Duration,
        token_ttl: Duration,
    ) -> Self {
        Self {
            store,
            hasher,
            tokens,
            credential_ttl,
            token_ttl,
        }
    }

    pub fn credential_ttl(&self) -> Duration {
        self.credential_ttl
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    pub async fn issue(&self, identity: &str) -> Result<IssuedCredential, CredentialError> {
        self.issue_at(identity, Utc::now()).await
    }

    /// Replace any outstanding credential for `identity` with a new one.
    pub async fn issue_at(
        &self,
        identity: &str,
        now: DateTime<Utc>,
    ) -> Result<IssuedCredential, CredentialError> {
        let expires_at = now
            .checked_add_signed(self.credential_ttl)
            .ok_or(CredentialError::LifetimeOutOfRange)?;
        let secret = generate_secret();
        let secret_hash = self.hash(secret.clone()).await?;

        self.store
            .put(identity, PendingCredential::new(secret_hash, expires_at))
            .await?;

        info!(identity = %identity, expires_at = %expires_at, "Magic link issued");
        Ok(IssuedCredential { secret, expires_at })
    }

    /// Drop the credential just issued for `identity`.
    pub async fn revoke(&self, identity: &str) -> Result<bool, CredentialError> {
        Ok(self.store.delete(identity).await?)
    }

    pub async fn verify(&self, identity: &str, secret: &str) -> Result<String, CredentialError> {
        self.verify_at(identity, secret, Utc::now()).await
    }

    /// Consume the credential for `identity` and return a session token.
    pub async fn verify_at(
        &self,
        identity: &str,
        secret: &str,
        now: DateTime<Utc>,
    ) -> Result<String, CredentialError> {
        let credential = self
            .store
            .get(identity)
            .await?
            .ok_or(CredentialError::NotFound)?;

        if credential.used {
            return Err(CredentialError::AlreadyUsed);
        }
        if credential.is_expired(now) {
            return Err(CredentialError::Expired);
        }
        if !self
            .matches(secret.to_string(), credential.secret_hash.clone())
            .await?
        {
            debug!(identity = %identity, "Magic link secret mismatch");
            return Err(CredentialError::Mismatch);
        }

        let token = self.tokens.issue_at(identity, self.token_ttl, now)?;

        if !self.store.mark_used(identity, &credential.secret_hash).await? {
            // Lost a race: either consumed concurrently or replaced by a reissue.
            let current = self.store.get(identity).await?;
            warn!(identity = %identity, "Magic link consumed concurrently");
            return Err(match current {
                Some(c) if c.secret_hash == credential.secret_hash => CredentialError::AlreadyUsed,
                _ => CredentialError::Mismatch,
            });
        }

        info!(identity = %identity, "Magic link verified, session token issued");
        Ok(token)
    }

    /// Remove every unused credential expired at `now`.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, CredentialError> {
        Ok(self.store.purge_expired(now).await?)
    }

    // argon2 is CPU-bound; keep it off the async workers.
    async fn hash(&self, secret: String) -> Result<String, CredentialError> {
        let hasher = self.hasher.clone();
        let hashed = tokio::task::spawn_blocking(move || hasher.hash(&secret))
            .await
            .map_err(HashError::from)?;
        Ok(hashed?)
    }

    async fn matches(&self, secret: String, stored: String) -> Result<bool, CredentialError> {
        let hasher = self.hasher.clone();
        let matched = tokio::task::spawn_blocking(move || hasher.verify(&secret, &stored))
            .await
            .map_err(HashError::from)?;
        Ok(matched?)
    }
}
