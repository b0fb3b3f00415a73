//! Warehouse loading
//!
//! Each table is fully replaced: dropped, recreated from the row's column list,
//! then filled in chunks, all inside one transaction per table. The two tables
//! are written independently so a failure in one never skips the other, and
//! the warehouse session is released on every path.

use async_trait::async_trait;
use dealflow_common::types::{quote_ident, Column, DealRow, LeadRow, DEALS_TABLE, LEADS_TABLE};
use sqlx::pool::PoolConnection;
use sqlx::query_builder::Separated;
use sqlx::{Connection, PgPool, Postgres, QueryBuilder};
use tracing::{error, info};

/// Rows per INSERT statement, kept well below the bind parameter limit.
pub const INSERT_CHUNK_SIZE: usize = 1000;

/// A row type with a fixed target table
pub trait WarehouseRow: Send + Sync {
    const TABLE: &'static str;
    const COLUMNS: &'static [Column];

    /// Bind this row's values in `COLUMNS` order.
    fn push_binds(&self, row: &mut Separated<'_, '_, Postgres, &'static str>);
}

impl WarehouseRow for DealRow {
    const TABLE: &'static str = DEALS_TABLE;
    const COLUMNS: &'static [Column] = DealRow::COLUMNS;

    fn push_binds(&self, row: &mut Separated<'_, '_, Postgres, &'static str>) {
        row.push_bind(self.deal_id.clone())
            .push_bind(self.deal_name.clone())
            .push_bind(self.amount)
            .push_bind(self.stage.clone())
            .push_bind(self.created_at)
            .push_bind(self.associated_company_id.clone());
    }
}

impl WarehouseRow for LeadRow {
    const TABLE: &'static str = LEADS_TABLE;
    const COLUMNS: &'static [Column] = LeadRow::COLUMNS;

    fn push_binds(&self, row: &mut Separated<'_, '_, Postgres, &'static str>) {
        row.push_bind(self.lead_id.clone())
            .push_bind(self.email.clone())
            .push_bind(self.first_name.clone())
            .push_bind(self.last_name.clone())
            .push_bind(self.status.clone())
            .push_bind(self.created_at);
    }
}

/// Source of warehouse sessions
#[async_trait]
pub trait Warehouse: Send + Sync {
    type Session: WarehouseSession;

    async fn open(&self) -> Result<Self::Session, sqlx::Error>;
}

/// One connection's worth of table writes
#[async_trait]
pub trait WarehouseSession: Send + Sized {
    /// Replace the contents of `R::TABLE` with `rows`, returning rows written.
    async fn replace_table<R: WarehouseRow>(&mut self, rows: &[R]) -> Result<u64, sqlx::Error>;

    /// Release the underlying connection.
    async fn close(self);
}

/// PostgreSQL-backed warehouse
#[derive(Clone)]
pub struct PgWarehouse {
    pool: PgPool,
}

impl PgWarehouse {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Warehouse for PgWarehouse {
    type Session = PgSession;

    async fn open(&self) -> Result<PgSession, sqlx::Error> {
        Ok(PgSession {
            conn: self.pool.acquire().await?,
        })
    }
}

pub struct PgSession {
    conn: PoolConnection<Postgres>,
}

#[async_trait]
impl WarehouseSession for PgSession {
    async fn replace_table<R: WarehouseRow>(&mut self, rows: &[R]) -> Result<u64, sqlx::Error> {
        let table = quote_ident(R::TABLE);
        let mut tx = Connection::begin(&mut *self.conn).await?;

        sqlx::query(&format!("DROP TABLE IF EXISTS {table}"))
            .execute(&mut *tx)
            .await?;
        sqlx::query(&create_table_sql(R::TABLE, R::COLUMNS))
            .execute(&mut *tx)
            .await?;

        let column_list = R::COLUMNS
            .iter()
            .map(|c| c.name)
            .collect::<Vec<_>>()
            .join(", ");

        let mut written = 0;
        for chunk in rows.chunks(INSERT_CHUNK_SIZE) {
            let mut query_builder: QueryBuilder<Postgres> =
                QueryBuilder::new(format!("INSERT INTO {table} ({column_list}) "));

            query_builder.push_values(chunk, |mut b, row| row.push_binds(&mut b));

            written += query_builder.build().execute(&mut *tx).await?.rows_affected();
        }

        tx.commit().await?;
        Ok(written)
    }

    async fn close(self) {
        // Dropping a pooled connection hands it back to the pool.
        drop(self.conn);
    }
}

/// `CREATE TABLE` statement for a row shape
pub fn create_table_sql(table: &str, columns: &[Column]) -> String {
    let definitions = columns
        .iter()
        .map(|c| format!("{} {}", c.name, c.sql_type))
        .collect::<Vec<_>>()
        .join(", ");

    format!("CREATE TABLE IF NOT EXISTS {} ({})", quote_ident(table), definitions)
}

/// A single table that could not be written
#[derive(Debug, thiserror::Error)]
#[error("{table}: {source}")]
pub struct TableLoadFailure {
    pub table: &'static str,
    #[source]
    pub source: sqlx::Error,
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("could not open a warehouse session: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("warehouse load failed for {}", describe(.0))]
    Tables(Vec<TableLoadFailure>),
}

impl LoadError {
    /// Names of the tables that failed, empty for connection failures.
    pub fn failed_tables(&self) -> Vec<&'static str> {
        match self {
            LoadError::Connect(_) => Vec::new(),
            LoadError::Tables(failures) => failures.iter().map(|f| f.table).collect(),
        }
    }
}

fn describe(failures: &[TableLoadFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub deals_loaded: u64,
    pub leads_loaded: u64,
}

/// Writes both tables through a [`Warehouse`]
pub struct Loader<W> {
    warehouse: W,
}

impl<W: Warehouse> Loader<W> {
    pub fn new(warehouse: W) -> Self {
        Self { warehouse }
    }

    pub async fn load(&self, deals: &[DealRow], leads: &[LeadRow]) -> Result<LoadStats, LoadError> {
        info!(deals = deals.len(), leads = leads.len(), "Loading tables into warehouse");

        let mut session = self.warehouse.open().await.map_err(LoadError::Connect)?;
        let mut failures = Vec::new();

        let deals_loaded = write_table(&mut session, deals, &mut failures).await;
        let leads_loaded = write_table(&mut session, leads, &mut failures).await;

        session.close().await;

        if !failures.is_empty() {
            return Err(LoadError::Tables(failures));
        }

        let stats = LoadStats {
            deals_loaded,
            leads_loaded,
        };
        info!(?stats, "Warehouse load complete");
        Ok(stats)
    }
}

async fn write_table<S: WarehouseSession, R: WarehouseRow>(
    session: &mut S,
    rows: &[R],
    failures: &mut Vec<TableLoadFailure>,
) -> u64 {
    match session.replace_table(rows).await {
        Ok(written) => {
            info!(table = R::TABLE, rows = written, "Table replaced");
            written
        },
        Err(source) => {
            error!(table = R::TABLE, error = %source, "Table load failed");
            failures.push(TableLoadFailure {
                table: R::TABLE,
                source,
            });
            0
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct FakeWarehouse {
        events: Arc<Mutex<Vec<String>>>,
        failing_table: Option<&'static str>,
        refuse_connection: bool,
    }

    struct FakeSession {
        events: Arc<Mutex<Vec<String>>>,
        failing_table: Option<&'static str>,
    }

    #[async_trait]
    impl Warehouse for FakeWarehouse {
        type Session = FakeSession;

        async fn open(&self) -> Result<FakeSession, sqlx::Error> {
            if self.refuse_connection {
                return Err(sqlx::Error::PoolTimedOut);
            }
            self.events.lock().unwrap().push("open".to_string());
            Ok(FakeSession {
                events: self.events.clone(),
                failing_table: self.failing_table,
            })
        }
    }

    #[async_trait]
    impl WarehouseSession for FakeSession {
        async fn replace_table<R: WarehouseRow>(
            &mut self,
            rows: &[R],
        ) -> Result<u64, sqlx::Error> {
            self.events
                .lock()
                .unwrap()
                .push(format!("replace {} ({})", R::TABLE, rows.len()));
            if self.failing_table == Some(R::TABLE) {
                return Err(sqlx::Error::Protocol(format!("{} is read-only", R::TABLE)));
            }
            Ok(rows.len() as u64)
        }

        async fn close(self) {
            self.events.lock().unwrap().push("close".to_string());
        }
    }

    fn deal(id: &str) -> DealRow {
        DealRow {
            deal_id: id.to_string(),
            deal_name: None,
            amount: 0.0,
            stage: None,
            created_at: None,
            associated_company_id: None,
        }
    }

    fn lead(id: &str) -> LeadRow {
        LeadRow {
            lead_id: id.to_string(),
            email: None,
            first_name: None,
            last_name: None,
            status: "UNKNOWN".to_string(),
            created_at: None,
        }
    }

    #[tokio::test]
    async fn loads_both_tables_and_closes() {
        let warehouse = FakeWarehouse::default();
        let loader = Loader::new(warehouse.clone());

        let stats = loader.load(&[deal("1"), deal("2")], &[lead("a")]).await.unwrap();

        assert_eq!(stats.deals_loaded, 2);
        assert_eq!(stats.leads_loaded, 1);
        assert_eq!(
            *warehouse.events.lock().unwrap(),
            ["open", "replace DEALS (2)", "replace LEADS (1)", "close"]
        );
    }

    #[tokio::test]
    async fn first_table_failure_still_writes_second_and_closes() {
        let warehouse = FakeWarehouse {
            failing_table: Some(DEALS_TABLE),
            ..Default::default()
        };
        let loader = Loader::new(warehouse.clone());

        let err = loader.load(&[deal("1")], &[lead("a")]).await.unwrap_err();

        assert_eq!(err.failed_tables(), [DEALS_TABLE]);
        assert!(err.to_string().contains("DEALS is read-only"));
        assert_eq!(
            *warehouse.events.lock().unwrap(),
            ["open", "replace DEALS (1)", "replace LEADS (1)", "close"]
        );
    }

    #[tokio::test]
    async fn second_table_failure_is_reported() {
        let warehouse = FakeWarehouse {
            failing_table: Some(LEADS_TABLE),
            ..Default::default()
        };
        let loader = Loader::new(warehouse.clone());

        let err = loader.load(&[deal("1")], &[lead("a")]).await.unwrap_err();

        assert_eq!(err.failed_tables(), [LEADS_TABLE]);
        assert_eq!(warehouse.events.lock().unwrap().last().map(String::as_str), Some("close"));
    }

    #[tokio::test]
    async fn connection_failure_writes_nothing() {
        let warehouse = FakeWarehouse {
            refuse_connection: true,
            ..Default::default()
        };
        let loader = Loader::new(warehouse.clone());

        let err = loader.load(&[deal("1")], &[]).await.unwrap_err();

        assert!(matches!(err, LoadError::Connect(_)));
        assert!(warehouse.events.lock().unwrap().is_empty());
    }

    #[test]
    fn create_table_sql_quotes_the_table() {
        assert_eq!(
            create_table_sql(LEADS_TABLE, &LeadRow::COLUMNS[..2]),
            "CREATE TABLE IF NOT EXISTS \"LEADS\" (lead_id TEXT NOT NULL, email TEXT)"
        );
    }
}
