//! Redeem a magic link for a session token

use serde::{Deserialize, Serialize};

use crate::auth::CredentialError;
use crate::features::shared::validation::{normalize_email, EmailValidationError};
use crate::features::AppState;

/// Token type reported alongside every access token.
pub const TOKEN_TYPE: &str = "bearer";

/// Query string of the emailed link
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyLoginCommand {
    pub token: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

#[derive(Debug, thiserror::Error)]
pub enum VerifyLoginError {
    #[error("Email validation failed: {0}")]
    Validation(#[from] EmailValidationError),

    #[error(transparent)]
    Credential(#[from] CredentialError),
}

#[tracing::instrument(skip(state, command))]
pub async fn handle(
    state: &AppState,
    command: VerifyLoginCommand,
) -> Result<TokenResponse, VerifyLoginError> {
    let identity = normalize_email(&command.email)?;
    let access_token = state.magic_links.verify(&identity, &command.token).await?;

    Ok(TokenResponse {
        access_token,
        token_type: TOKEN_TYPE.to_string(),
    })
}
