//! One-time magic-link secrets and their salted hashes

use crate::config::HashCost;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};

/// Random bytes per secret before encoding.
pub const SECRET_BYTES: usize = 32;

/// An outstanding magic link for one identity.
///
/// Only the hash of the secret is kept; the plaintext leaves the process in
/// the email and is never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingCredential {
    pub secret_hash: String,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
}

impl PendingCredential {
    pub fn new(secret_hash: String, expires_at: DateTime<Utc>) -> Self {
        Self {
            secret_hash,
            expires_at,
            used: false,
        }
    }

    /// Expired once `now` reaches `expires_at`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Generate a URL-safe secret from `SECRET_BYTES` of OS randomness.
pub fn generate_secret() -> String {
    let mut bytes = [0u8; SECRET_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[derive(Debug, thiserror::Error)]
#[error("credential hashing failed: {0}")]
pub struct HashError(String);

impl From<argon2::password_hash::Error> for HashError {
    fn from(err: argon2::password_hash::Error) -> Self {
        HashError(err.to_string())
    }
}

impl From<tokio::task::JoinError> for HashError {
    fn from(err: tokio::task::JoinError) -> Self {
        HashError(format!("hashing task did not complete: {err}"))
    }
}

impl From<argon2::Error> for HashError {
    fn from(err: argon2::Error) -> Self {
        HashError(err.to_string())
    }
}

/// argon2id hasher with tunable cost
#[derive(Clone)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
}

impl CredentialHasher {
    pub fn new(cost: HashCost) -> Result<Self, HashError> {
        let params = Params::new(cost.memory_kib, cost.iterations, cost.parallelism, None)?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Hash `secret` with a fresh random salt into a PHC string.
    pub fn hash(&self, secret: &str) -> Result<String, HashError> {
        let salt = SaltString::generate(&mut OsRng);
        Ok(self
            .argon2
            .hash_password(secret.as_bytes(), &salt)?
            .to_string())
    }

    /// Whether `secret` matches the PHC string `stored`.
    ///
    /// A malformed stored hash is an error; a wrong secret is `Ok(false)`.
    pub fn verify(&self, secret: &str, stored: &str) -> Result<bool, HashError> {
        let parsed = PasswordHash::new(stored)?;
        match self.argon2.verify_password(secret.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) fn cheap_hasher() -> CredentialHasher {
    CredentialHasher::new(HashCost {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    })
    .unwrap()
}
