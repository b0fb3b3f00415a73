//! Dealflow ETL Library
//!
//! Pulls deals and contacts from the HubSpot CRM, flattens them into tabular
//! rows and replaces the `DEALS` and `LEADS` warehouse tables.
//!
//! # Example
//!
//! ```no_run
//! use dealflow_etl::{
//!     config::EtlConfig,
//!     hubspot::CrmExtractor,
//!     load::{Loader, PgWarehouse},
//!     pipeline::Pipeline,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = EtlConfig::load()?;
//!     let pool = config.warehouse.connect().await?;
//!
//!     let pipeline = Pipeline::new(
//!         CrmExtractor::new(config.crm)?,
//!         Loader::new(PgWarehouse::new(pool)),
//!     );
//!     let stats = pipeline.run().await?;
//!     tracing::info!(?stats, "done");
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod hubspot;
pub mod load;
pub mod pipeline;
pub mod transform;

pub use error::{EtlError, Result};
