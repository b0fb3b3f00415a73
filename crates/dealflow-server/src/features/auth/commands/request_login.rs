//! Request a magic link
//!
//! Validates the email, issues a fresh one-time credential for it, and emails
//! the sign-in link. The acknowledgement is identical whether or not the
//! address is known, so the endpoint cannot be used to enumerate identities.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::auth::CredentialError;
use crate::features::shared::validation::{normalize_email, EmailValidationError};
use crate::features::AppState;
use crate::mailer::{DeliveryError, MagicLinkEmail};

/// Path the emailed link points at.
pub const VERIFY_LOGIN_PATH: &str = "verify-login";

/// Body returned on every accepted request.
pub const LOGIN_ACKNOWLEDGEMENT: &str =
    "If your email is registered, you will receive a sign-in link shortly.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestLoginCommand {
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RequestLoginResponse {
    pub message: String,
}

impl Default for RequestLoginResponse {
    fn default() -> Self {
        Self {
            message: LOGIN_ACKNOWLEDGEMENT.to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RequestLoginError {
    #[error("Email validation failed: {0}")]
    Validation(#[from] EmailValidationError),

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    #[error("Could not build the sign-in link: {0}")]
    Link(String),
}

/// Build `{base_url}/verify-login?token=..&email=..` with both values
/// form-encoded.
///
/// A path on the base URL is kept, so `https://host/api` yields
/// `https://host/api/verify-login`.
pub fn build_magic_link(base_url: &str, secret: &str, identity: &str) -> Result<Url, RequestLoginError> {
    let mut link = Url::parse(base_url).map_err(|e| RequestLoginError::Link(e.to_string()))?;

    link.path_segments_mut()
        .map_err(|_| RequestLoginError::Link(format!("{base_url} cannot be a base URL")))?
        .pop_if_empty()
        .push(VERIFY_LOGIN_PATH);

    link.query_pairs_mut()
        .clear()
        .append_pair("token", secret)
        .append_pair("email", identity);

    Ok(link)
}

/// Issue a credential for the email and send the link.
///
/// # Errors
///
/// - `Validation` when the email is malformed
/// - `Credential` when hashing or the store fails
/// - `Delivery` only when strict delivery is enabled; the credential is
///   revoked first so no unusable link stays pending
#[tracing::instrument(skip(state, command))]
pub async fn handle(
    state: &AppState,
    command: RequestLoginCommand,
) -> Result<RequestLoginResponse, RequestLoginError> {
    let identity = normalize_email(&command.email)?;

    let issued = state.magic_links.issue(&identity).await?;
    let link = build_magic_link(&state.config.server.base_url, &issued.secret, &identity)?;

    let email = MagicLinkEmail::compose(
        &identity,
        &link,
        &state.config.server.api_name,
        state.magic_links.credential_ttl().num_minutes(),
    );

    if let Err(e) = state.mailer.send(&email).await {
        if state.config.mail.strict_delivery {
            state.magic_links.revoke(&identity).await?;
            return Err(e.into());
        }
        tracing::warn!(identity = %identity, error = %e, "Magic link delivery failed");
    }

    Ok(RequestLoginResponse::default())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn link_carries_token_and_encoded_email() {
        let link = build_magic_link("https://api.example.com", "s3cr3t", "a+b@x.com").unwrap();

        assert_eq!(link.path(), "/verify-login");
        let pairs: Vec<(String, String)> = link.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("token".to_string(), "s3cr3t".to_string()),
                ("email".to_string(), "a+b@x.com".to_string()),
            ]
        );
        assert!(link.as_str().contains("email=a%2Bb%40x.com"));
    }

    #[test]
    fn link_keeps_base_path() {
        let link = build_magic_link("https://example.com/api/", "t", "a@x.com").unwrap();
        assert_eq!(link.path(), "/api/verify-login");

        let link = build_magic_link("https://example.com/api", "t", "a@x.com").unwrap();
        assert_eq!(link.path(), "/api/verify-login");
    }

    #[test]
    fn link_rejects_unusable_base() {
        assert!(matches!(
            build_magic_link("mailto:someone@example.com", "t", "a@x.com"),
            Err(RequestLoginError::Link(_))
        ));
        assert!(build_magic_link("not a url", "t", "a@x.com").is_err());
    }
}
