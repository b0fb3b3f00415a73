//! B2B vs B2C split of loaded deals
//!
//! A deal counts as B2B when the loader recorded an associated company for it.

use dealflow_common::types::{quote_ident, DEALS_TABLE};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::FromRow)]
pub struct DealSegmentsResponse {
    pub total_b2b: i64,
    pub total_b2c: i64,
    pub total: i64,
}

fn segments_sql() -> String {
    format!(
        "SELECT COUNT(associated_company_id) AS total_b2b, \
                COUNT(*) - COUNT(associated_company_id) AS total_b2c, \
                COUNT(*) AS total \
         FROM {}",
        quote_ident(DEALS_TABLE)
    )
}

/// Count deals with and without an associated company.
///
/// The connection is borrowed from the pool for this query only.
///
/// # Errors
///
/// Any warehouse failure, including a missing `DEALS` table before the first
/// ETL run.
#[tracing::instrument(skip(pool))]
pub async fn handle(pool: &PgPool) -> Result<DealSegmentsResponse, sqlx::Error> {
    let segments = sqlx::query_as::<_, DealSegmentsResponse>(&segments_sql())
        .fetch_one(pool)
        .await?;

    tracing::debug!(
        total_b2b = segments.total_b2b,
        total_b2c = segments.total_b2c,
        "Deal segments counted"
    );
    Ok(segments)
}
