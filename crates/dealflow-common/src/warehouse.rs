//! Warehouse connection settings.
//!
//! The warehouse is the PostgreSQL-compatible analytical store that the ETL
//! loads into and the server's metrics endpoints read from. Both binaries build
//! their pool from the same [`WarehouseConfig`].

use crate::{env, DealflowError, Result};
use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

/// Default maximum connections in the warehouse pool.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Default time to wait for a warehouse connection, in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Clone, Serialize, Deserialize)]
pub struct WarehouseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
}

// The URL usually embeds a password.
impl std::fmt::Debug for WarehouseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WarehouseConfig")
            .field("url", &"<redacted>")
            .field("max_connections", &self.max_connections)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

impl WarehouseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }

    /// Read `WAREHOUSE_URL` (or `DATABASE_URL`), `WAREHOUSE_MAX_CONNECTIONS`
    /// and `WAREHOUSE_CONNECT_TIMEOUT`.
    pub fn from_env() -> Result<Self> {
        let url = env::first_non_empty(&["WAREHOUSE_URL", "DATABASE_URL"]).ok_or_else(|| {
            DealflowError::Config("WAREHOUSE_URL or DATABASE_URL must be set".to_string())
        })?;

        let config = Self {
            url,
            max_connections: env::parse_or("WAREHOUSE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS),
            connect_timeout_secs: env::parse_or(
                "WAREHOUSE_CONNECT_TIMEOUT",
                DEFAULT_CONNECT_TIMEOUT_SECS,
            ),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(DealflowError::Config("Warehouse URL cannot be empty".to_string()));
        }
        if self.max_connections == 0 {
            return Err(DealflowError::Config(
                "Warehouse max_connections must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    fn pool_options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(Duration::from_secs(self.connect_timeout_secs))
    }

    /// Open a pool and establish the first connection.
    pub async fn connect(&self) -> Result<PgPool> {
        Ok(self.pool_options().connect(&self.url).await?)
    }

    /// Build a pool that connects on first use.
    ///
    /// The server starts even when the warehouse is down; the health endpoint
    /// reports the outage instead.
    pub fn connect_lazy(&self) -> Result<PgPool> {
        Ok(self.pool_options().connect_lazy(&self.url)?)
    }
}
