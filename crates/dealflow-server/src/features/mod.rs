//! Feature modules implementing the Dealflow API
//!
//! Each feature is a vertical slice with its own commands, queries and
//! routes:
//!
//! - **auth**: magic-link sign-in and the current-user check
//! - **metrics**: aggregates over the loaded warehouse tables
//!
//! # Architecture
//!
//! Each feature module follows the structure:
//! - `commands/` - Operations that change state
//! - `queries/` - Read operations
//! - `routes.rs` - HTTP route definitions

pub mod auth;
pub mod metrics;
pub mod shared;

use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use sqlx::PgPool;

use crate::auth::{CredentialHasher, InMemoryCredentialStore, MagicLinkService, SessionTokenCodec};
use crate::config::Config;
use crate::mailer::MagicLinkSender;

/// Shared state for all feature routes
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Issues and redeems magic links
    pub magic_links: Arc<MagicLinkService>,
    /// Verifies bearer tokens on protected routes
    pub tokens: Arc<SessionTokenCodec>,
    pub mailer: Arc<dyn MagicLinkSender>,
    /// Warehouse pool; connections are taken per request
    pub warehouse: PgPool,
}

impl AppState {
    /// Wire the services described by `config` around the given mail sender.
    ///
    /// The warehouse pool connects lazily, so the server starts even when the
    /// warehouse is down; `/health` reports it.
    pub fn from_config(config: Config, mailer: Arc<dyn MagicLinkSender>) -> anyhow::Result<Self> {
        let tokens = Arc::new(SessionTokenCodec::from_config(
            &config.auth.jwt_secret,
            &config.auth.jwt_algorithm,
        )?);
        let hasher = CredentialHasher::new(config.auth.hash)?;
        let credential_ttl = chrono::Duration::try_minutes(config.auth.credential_ttl_minutes)
            .context("MAGIC_LINK_EXPIRE_MINUTES is out of range")?;
        let token_ttl = chrono::Duration::try_minutes(config.auth.token_ttl_minutes)
            .context("JWT_ACCESS_TOKEN_EXPIRE_MINUTES is out of range")?;

        let magic_links = Arc::new(MagicLinkService::new(
            Arc::new(InMemoryCredentialStore::new()),
            hasher,
            tokens.clone(),
            credential_ttl,
            token_ttl,
        ));

        let warehouse = config.warehouse.connect_lazy()?;

        Ok(Self {
            config: Arc::new(config),
            magic_links,
            tokens,
            mailer,
            warehouse,
        })
    }
}

impl FromRef<AppState> for Arc<SessionTokenCodec> {
    fn from_ref(state: &AppState) -> Self {
        state.tokens.clone()
    }
}

/// Creates the API router with all feature routes mounted
///
/// - `/` - Service banner
/// - `/health` - Warehouse reachability
/// - `/log-in`, `/verify-login`, `/users/me` - Authentication
/// - `/metrics` - Warehouse aggregates (protected)
pub fn router(state: AppState) -> Router<()> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .merge(auth::auth_routes())
        .nest("/metrics", metrics::metrics_routes())
        .with_state(state)
}

async fn root() -> Json<Value> {
    Json(json!({ "status": "Service active." }))
}

async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match sqlx::query("SELECT 1").execute(&state.warehouse).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "warehouse": "connected"
            })),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Health check failed: warehouse unreachable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unhealthy",
                    "warehouse": "disconnected"
                })),
            )
        },
    }
}
