//! Tabular rows written to and read from the warehouse.
//!
//! The ETL produces one [`DealRow`] per CRM deal and one [`LeadRow`] per CRM
//! contact. Table and column names are shared so the server's queries stay in
//! step with what the loader creates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEALS_TABLE: &str = "DEALS";
pub const LEADS_TABLE: &str = "LEADS";

/// Status stored for contacts whose lead status is unset.
pub const UNKNOWN_LEAD_STATUS: &str = "UNKNOWN";

/// A column of a warehouse table as created by the loader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub sql_type: &'static str,
}

const fn column(name: &'static str, sql_type: &'static str) -> Column {
    Column { name, sql_type }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealRow {
    pub deal_id: String,
    pub deal_name: Option<String>,
    /// Never negative; absent or unparseable amounts are stored as 0.
    pub amount: f64,
    pub stage: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    /// First associated company, if the deal has one.
    pub associated_company_id: Option<String>,
}

impl DealRow {
    pub const COLUMNS: &'static [Column] = &[
        column("deal_id", "TEXT NOT NULL"),
        column("deal_name", "TEXT"),
        column("amount", "DOUBLE PRECISION NOT NULL"),
        column("stage", "TEXT"),
        column("created_at", "TIMESTAMPTZ"),
        column("associated_company_id", "TEXT"),
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadRow {
    pub lead_id: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub status: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl LeadRow {
    pub const COLUMNS: &'static [Column] = &[
        column("lead_id", "TEXT NOT NULL"),
        column("email", "TEXT"),
        column("first_name", "TEXT"),
        column("last_name", "TEXT"),
        column("status", "TEXT NOT NULL"),
        column("created_at", "TIMESTAMPTZ"),
    ];
}

/// Quote an identifier for PostgreSQL so upper-case table names survive.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn quote_ident_preserves_case_and_escapes_quotes() {
        assert_eq!(quote_ident(DEALS_TABLE), "\"DEALS\"");
        assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn column_lists_match_row_fields() {
        let deal_columns: Vec<_> = DealRow::COLUMNS.iter().map(|c| c.name).collect();
        assert_eq!(
            deal_columns,
            ["deal_id", "deal_name", "amount", "stage", "created_at", "associated_company_id"]
        );

        let lead_columns: Vec<_> = LeadRow::COLUMNS.iter().map(|c| c.name).collect();
        assert_eq!(
            lead_columns,
            ["lead_id", "email", "first_name", "last_name", "status", "created_at"]
        );
    }
}
