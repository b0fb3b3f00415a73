//! Dealflow Server Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! HTTP service for passwordless sign-in and deal metrics.
//!
//! # Overview
//!
//! - **Magic links**: `POST /log-in` emails a one-time link, `GET /verify-login`
//!   redeems it for a signed session token
//! - **Protected routes**: `GET /users/me` and `GET /metrics/deals/b2b-vs-b2c`
//!   require `Authorization: Bearer <token>`
//! - **Warehouse**: metrics read the tables the `dealflow-etl` pipeline loads
//!
//! # Example
//!
//! ```no_run
//! use dealflow_server::{app, config::Config, features::AppState, mailer};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let sender = mailer::from_config(&config.mail)?;
//!     let state = AppState::from_config(config.clone(), sender)?;
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8000").await?;
//!     axum::serve(listener, app(state, &config)).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod features;
pub mod mailer;
pub mod middleware;

pub use error::{ApiResult, AppError};

use axum::Router;
use config::Config;
use features::AppState;

/// Build the application router with all routes and middleware
pub fn app(state: AppState, config: &Config) -> Router {
    features::router(state)
        .layer(middleware::tracing_layer())
        .layer(middleware::cors_layer(&config.cors))
}
