//! Warehouse metrics routes
//!
//! Every route here requires a session token.

use axum::{extract::State, routing::get, Json, Router};

use super::queries::DealSegmentsResponse;
use crate::auth::AuthenticatedUser;
use crate::error::ApiResult;
use crate::features::AppState;

pub fn metrics_routes() -> Router<AppState> {
    Router::new().route("/deals/b2b-vs-b2c", get(deal_segments))
}

/// B2B vs B2C deal counts
///
/// # Endpoint
///
/// `GET /metrics/deals/b2b-vs-b2c` with `Authorization: Bearer <token>`
///
/// # Response
///
/// - `200 OK` - `{"total_b2b": 12, "total_b2c": 30, "total": 42}`
/// - `401 Unauthorized` - Missing or invalid token
/// - `500 Internal Server Error` - Warehouse unavailable or not yet loaded
#[tracing::instrument(skip(state, user), fields(identity = %user.identity()))]
async fn deal_segments(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<DealSegmentsResponse>> {
    let segments = super::queries::deal_segments::handle(&state.warehouse).await?;
    Ok(Json(segments))
}
