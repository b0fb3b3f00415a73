//! Dealflow Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared building blocks for the Dealflow workspace members:
//!
//! - **Error Handling**: [`DealflowError`] and the crate [`Result`] alias
//! - **Logging**: structured `tracing` setup driven by the environment
//! - **Warehouse**: connection settings for the analytical store
//! - **Types**: the tabular rows the ETL loads and the server reads
//!
//! # Example
//!
//! ```no_run
//! use dealflow_common::logging::{init_logging, LogConfig};
//! use dealflow_common::warehouse::WarehouseConfig;
//!
//! # async fn run() -> anyhow::Result<()> {
//! init_logging(&LogConfig::from_env()?)?;
//! let pool = WarehouseConfig::from_env()?.connect().await?;
//! # drop(pool);
//! # Ok(())
//! # }
//! ```

pub mod env;
pub mod error;
pub mod logging;
pub mod types;
pub mod warehouse;

pub use error::{DealflowError, Result};
