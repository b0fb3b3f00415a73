//! Signed, time-bounded session tokens (JWT, HMAC family)

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// Bad signature, wrong algorithm or not a JWT at all
    #[error("Could not validate credentials")]
    InvalidSignature,

    #[error("Session token has expired")]
    Expired,

    #[error("Session token has no subject")]
    MissingSubject,

    #[error("Failed to sign session token: {0}")]
    Encoding(String),

    #[error("Unsupported JWT algorithm: {0}")]
    UnsupportedAlgorithm(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
}

/// Only HMAC algorithms are accepted; the secret is a shared key.
pub fn parse_algorithm(alg: &str) -> Result<Algorithm, TokenError> {
    match Algorithm::from_str(alg) {
        Ok(algorithm @ (Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)) => Ok(algorithm),
        _ => Err(TokenError::UnsupportedAlgorithm(alg.to_string())),
    }
}

/// Issues and checks session tokens with a process-wide secret
#[derive(Clone)]
pub struct SessionTokenCodec {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl SessionTokenCodec {
    pub fn new(secret: &str, algorithm: Algorithm) -> Self {
        Self {
            algorithm,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn from_config(secret: &str, algorithm: &str) -> Result<Self, TokenError> {
        Ok(Self::new(secret, parse_algorithm(algorithm)?))
    }

    pub fn issue(&self, subject: &str, ttl: Duration) -> Result<String, TokenError> {
        self.issue_at(subject, ttl, Utc::now())
    }

    pub fn issue_at(
        &self,
        subject: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let exp = now
            .checked_add_signed(ttl)
            .ok_or_else(|| TokenError::Encoding("token lifetime is out of range".to_string()))?;
        let claims = SessionClaims {
            sub: Some(subject.to_string()),
            exp: exp.timestamp(),
            iat: Some(now.timestamp()),
        };

        encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    /// Verify `token` and return its subject.
    pub fn decode(&self, token: &str) -> Result<String, TokenError> {
        self.decode_at(token, Utc::now())
    }

    /// Checks run in order: signature, expiry, subject.
    pub fn decode_at(&self, token: &str, now: DateTime<Utc>) -> Result<String, TokenError> {
        let mut validation = Validation::new(self.algorithm);
        // Expiry is compared against `now` below so it has no leeway.
        validation.validate_exp = false;

        let claims = decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map_err(|_| TokenError::InvalidSignature)?
            .claims;

        if now.timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }

        claims
            .sub
            .filter(|sub| !sub.is_empty())
            .ok_or(TokenError::MissingSubject)
    }
}
