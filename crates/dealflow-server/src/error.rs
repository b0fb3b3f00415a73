//! HTTP error mapping
//!
//! Every handler returns `Result<_, AppError>`. Errors render as
//! `{"success": false, "error": {"code", "message"}}` with the matching status.

use crate::auth::{CredentialError, TokenError};
use crate::mailer::DeliveryError;
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Result alias for handlers
pub type ApiResult<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("Not authenticated")]
    MissingCredentials,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Could not send the login email: {0}")]
    Delivery(#[from] DeliveryError),

    #[error("Warehouse error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
            },
        }
    }
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Credential(CredentialError::NotFound) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::Credential(
                CredentialError::AlreadyUsed | CredentialError::Expired | CredentialError::Mismatch,
            ) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            AppError::Credential(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            AppError::Token(
                TokenError::InvalidSignature | TokenError::Expired | TokenError::MissingSubject,
            )
            | AppError::MissingCredentials => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            AppError::Token(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            AppError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            AppError::Delivery(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DELIVERY_FAILED"),
            AppError::Database(_) | AppError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            AppError::Database(e) => {
                tracing::error!(error = ?e, "Warehouse error");
                "A warehouse error occurred".to_string()
            },
            AppError::Credential(
                CredentialError::Hashing(_)
                | CredentialError::Store(_)
                | CredentialError::LifetimeOutOfRange,
            )
            | AppError::Token(TokenError::Encoding(_) | TokenError::UnsupportedAlgorithm(_))
            | AppError::Internal(_) => {
                tracing::error!(error = %self, "Internal error");
                "An internal error occurred".to_string()
            },
            AppError::Delivery(e) => {
                tracing::error!(error = %e, "Magic link delivery failed");
                self.to_string()
            },
            _ => self.to_string(),
        };

        let mut response = (status, Json(ErrorResponse::new(code, message))).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn credential_errors_map_to_client_statuses() {
        assert_eq!(status(CredentialError::NotFound.into()), StatusCode::NOT_FOUND);
        assert_eq!(status(CredentialError::AlreadyUsed.into()), StatusCode::BAD_REQUEST);
        assert_eq!(status(CredentialError::Expired.into()), StatusCode::BAD_REQUEST);
        assert_eq!(status(CredentialError::Mismatch.into()), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn token_errors_are_unauthorized_with_challenge() {
        for err in [
            TokenError::InvalidSignature,
            TokenError::Expired,
            TokenError::MissingSubject,
        ] {
            let response = AppError::from(err).into_response();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");
        }
    }

    #[test]
    fn signing_failure_is_a_server_error() {
        assert_eq!(
            status(TokenError::Encoding("bad key".to_string()).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn validation_is_unprocessable() {
        assert_eq!(
            status(AppError::Validation("Invalid email".to_string())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn delivery_failure_is_a_server_error() {
        assert_eq!(
            status(DeliveryError::NotConfigured.into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
