//! Shared validation utilities
//!
//! # Examples
//!
//! ```rust,ignore
//! use dealflow_server::features::shared::validation::normalize_email;
//!
//! let identity = normalize_email("  Ana@Example.COM ")?;
//! assert_eq!(identity, "ana@example.com");
//! ```

use thiserror::Error;
use validator::ValidateEmail;

/// Longest address accepted (RFC 5321 path limit).
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Errors that can occur during email validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EmailValidationError {
    #[error("Email is required and cannot be empty")]
    Required,

    #[error("Email must be at most {max_length} characters")]
    TooLong { max_length: usize },

    #[error("Email must look like name@domain.tld")]
    InvalidFormat,
}

/// Validate an email address and return the identity key used for it.
///
/// # Rules
/// - Must not be empty after trimming
/// - At most [`MAX_EMAIL_LENGTH`] characters
/// - HTML5 address syntax as checked by `validator`, including
///   internationalized domains
/// - The domain has at least one dot (no bare hosts like `localhost`)
///
/// The result is trimmed and lower-cased so `Ana@Example.com` and
/// `ana@example.com` share one pending credential.
pub fn normalize_email(raw: &str) -> Result<String, EmailValidationError> {
    let email = raw.trim();

    if email.is_empty() {
        return Err(EmailValidationError::Required);
    }

    if email.chars().count() > MAX_EMAIL_LENGTH {
        return Err(EmailValidationError::TooLong {
            max_length: MAX_EMAIL_LENGTH,
        });
    }

    if !email.validate_email() {
        return Err(EmailValidationError::InvalidFormat);
    }

    match email.rsplit_once('@') {
        Some((_, domain)) if domain.contains('.') => Ok(email.to_lowercase()),
        _ => Err(EmailValidationError::InvalidFormat),
    }
}
