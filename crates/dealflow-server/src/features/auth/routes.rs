//! Authentication API routes
//!
//! # Route Structure
//!
//! - `POST /log-in` - Email a magic link
//! - `GET /verify-login` - Redeem a magic link for a session token
//! - `GET /users/me` - Identity behind the presented bearer token

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

use super::{
    commands::{
        RequestLoginCommand, RequestLoginError, TokenResponse, VerifyLoginCommand,
        VerifyLoginError,
    },
    queries::CurrentUserResponse,
};
use crate::auth::AuthenticatedUser;
use crate::error::{ApiResult, AppError};
use crate::features::AppState;

// ============================================================================
// Router Configuration
// ============================================================================

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/log-in", post(request_login))
        .route("/verify-login", get(verify_login))
        .route("/users/me", get(current_user))
}

// ============================================================================
// Command Handlers
// ============================================================================

/// Request a sign-in link
///
/// # Endpoint
///
/// `POST /log-in`
///
/// # Request Body
///
/// ```json
/// { "email": "ana@example.com" }
/// ```
///
/// # Response
///
/// - `202 Accepted` - Same acknowledgement for known and unknown addresses
/// - `422 Unprocessable Entity` - Malformed email
/// - `500 Internal Server Error` - Hashing failure, or delivery failure in strict mode
#[tracing::instrument(skip(state, command))]
async fn request_login(
    State(state): State<AppState>,
    Json(command): Json<RequestLoginCommand>,
) -> ApiResult<Response> {
    let response = super::commands::request_login::handle(&state, command).await?;
    Ok((StatusCode::ACCEPTED, Json(response)).into_response())
}

/// Redeem a sign-in link
///
/// # Endpoint
///
/// `GET /verify-login?token={secret}&email={email}`
///
/// # Response
///
/// - `200 OK` - `{"access_token": "...", "token_type": "bearer"}`
/// - `400 Bad Request` - Link already used, expired, or wrong secret
/// - `404 Not Found` - No link was requested for this email
/// - `422 Unprocessable Entity` - Malformed email
#[tracing::instrument(skip(state, command))]
async fn verify_login(
    State(state): State<AppState>,
    Query(command): Query<VerifyLoginCommand>,
) -> ApiResult<Json<TokenResponse>> {
    let response = super::commands::verify_login::handle(&state, command).await?;
    Ok(Json(response))
}

// ============================================================================
// Query Handlers
// ============================================================================

/// Identity behind the session token
///
/// # Endpoint
///
/// `GET /users/me` with `Authorization: Bearer <token>`
///
/// # Response
///
/// - `200 OK` - `{"identity": "ana@example.com"}`
/// - `401 Unauthorized` - Missing, malformed, expired or subject-less token
#[tracing::instrument(skip(user), fields(identity = %user.identity()))]
async fn current_user(user: AuthenticatedUser) -> Json<CurrentUserResponse> {
    Json(super::queries::current_user::handle(user))
}

// ============================================================================
// Error Conversion
// ============================================================================

impl From<RequestLoginError> for AppError {
    fn from(err: RequestLoginError) -> Self {
        match err {
            RequestLoginError::Validation(e) => AppError::Validation(e.to_string()),
            RequestLoginError::Credential(e) => AppError::Credential(e),
            RequestLoginError::Delivery(e) => AppError::Delivery(e),
            RequestLoginError::Link(msg) => AppError::Internal(msg),
        }
    }
}

impl From<VerifyLoginError> for AppError {
    fn from(err: VerifyLoginError) -> Self {
        match err {
            VerifyLoginError::Validation(e) => AppError::Validation(e.to_string()),
            VerifyLoginError::Credential(e) => AppError::Credential(e),
        }
    }
}
