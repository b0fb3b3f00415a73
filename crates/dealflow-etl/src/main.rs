//! Dealflow ETL - CRM to warehouse loader

use anyhow::Result;
use clap::Parser;
use dealflow_common::logging::{init_logging, LogConfig, LogLevel};
use dealflow_etl::{
    config::{CrmConfig, EtlConfig},
    hubspot::CrmExtractor,
    load::{Loader, PgWarehouse},
    pipeline::{self, Pipeline},
};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "dealflow-etl")]
#[command(author, version, about = "Load HubSpot deals and contacts into the warehouse")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Extract, transform and load both tables
    Run {
        /// Stop after the transform step and only report what would be loaded
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = LogConfig::builder()
        .level(if cli.verbose {
            LogLevel::Debug
        } else {
            LogLevel::Info
        })
        .log_file_prefix("dealflow-etl")
        .filter_directives("reqwest=info,sqlx=warn")
        .build()
        .merge_dotenv()?;

    init_logging(&log_config)?;

    match cli.command {
        Command::Run { dry_run: true } => {
            let crm = CrmConfig::from_env()?;
            let extractor = CrmExtractor::new(crm)?;

            let prepared = pipeline::extract_and_transform(&extractor).await?;
            info!(
                deals = prepared.deals_extracted,
                contacts = prepared.contacts_extracted,
                deal_rows = prepared.rows.deals.len(),
                lead_rows = prepared.rows.leads.len(),
                "Dry run finished, nothing loaded"
            );
        },
        Command::Run { dry_run: false } => {
            let config = EtlConfig::load()?;
            let pool = config.warehouse.connect().await?;

            let pipeline = Pipeline::new(
                CrmExtractor::new(config.crm)?,
                Loader::new(PgWarehouse::new(pool.clone())),
            );
            let stats = pipeline.run().await;
            pool.close().await;

            let stats = stats?;
            info!(
                deals_loaded = stats.deals_loaded,
                leads_loaded = stats.leads_loaded,
                "ETL run complete"
            );
        },
    }

    Ok(())
}
