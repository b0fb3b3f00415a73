//! End-to-end pipeline runs with a mock CRM and an in-memory warehouse

use async_trait::async_trait;
use dealflow_common::types::{DealRow, LeadRow, DEALS_TABLE, LEADS_TABLE};
use dealflow_etl::config::CrmConfig;
use dealflow_etl::hubspot::{CrmExtractor, CONTACTS_PATH, DEALS_PATH};
use dealflow_etl::load::{LoadError, Loader, Warehouse, WarehouseRow, WarehouseSession};
use dealflow_etl::pipeline::Pipeline;
use dealflow_etl::EtlError;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Records the row count of every replaced table.
#[derive(Clone, Default)]
struct MemoryWarehouse {
    tables: Arc<Mutex<HashMap<&'static str, usize>>>,
    closed_sessions: Arc<Mutex<usize>>,
    fail_on: Option<&'static str>,
}

struct MemorySession {
    warehouse: MemoryWarehouse,
}

#[async_trait]
impl Warehouse for MemoryWarehouse {
    type Session = MemorySession;

    async fn open(&self) -> Result<MemorySession, sqlx::Error> {
        Ok(MemorySession {
            warehouse: self.clone(),
        })
    }
}

#[async_trait]
impl WarehouseSession for MemorySession {
    async fn replace_table<R: WarehouseRow>(&mut self, rows: &[R]) -> Result<u64, sqlx::Error> {
        if self.warehouse.fail_on == Some(R::TABLE) {
            return Err(sqlx::Error::Protocol("disk full".to_string()));
        }
        self.warehouse
            .tables
            .lock()
            .unwrap()
            .insert(R::TABLE, rows.len());
        Ok(rows.len() as u64)
    }

    async fn close(self) {
        *self.warehouse.closed_sessions.lock().unwrap() += 1;
    }
}

async fn mock_crm(deals: Value, contacts: Value) -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(DEALS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(deals))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(CONTACTS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(contacts))
        .mount(&server)
        .await;

    server
}

fn two_deals_one_contact() -> (Value, Value) {
    (
        json!({
            "results": [
                {
                    "id": "d-1",
                    "properties": { "dealname": "With company", "amount": "500", "dealstage": "won" },
                    "associations": { "companies": { "results": [{ "id": "42" }] } }
                },
                {
                    "id": "d-2",
                    "properties": { "dealname": "Solo", "amount": "not_a_number" }
                }
            ]
        }),
        json!({
            "results": [{ "id": "c-1", "properties": { "email": "ana@example.com" } }]
        }),
    )
}

fn extractor(server: &MockServer) -> CrmExtractor {
    CrmExtractor::new(CrmConfig::new("token").with_base_url(server.uri())).unwrap()
}

#[tokio::test]
async fn two_deals_and_one_contact_produce_matching_rows() {
    let (deals, contacts) = two_deals_one_contact();
    let server = mock_crm(deals, contacts).await;

    let prepared = dealflow_etl::pipeline::extract_and_transform(&extractor(&server))
        .await
        .unwrap();

    let deal_rows: &[DealRow] = &prepared.rows.deals;
    let lead_rows: &[LeadRow] = &prepared.rows.leads;

    assert_eq!(deal_rows.len(), 2);
    assert_eq!(lead_rows.len(), 1);
    assert_eq!(deal_rows[0].associated_company_id.as_deref(), Some("42"));
    assert_eq!(deal_rows[1].associated_company_id, None);
    assert_eq!(deal_rows[1].amount, 0.0);
    assert_eq!(lead_rows[0].status, "UNKNOWN");
}

#[tokio::test]
async fn full_run_loads_both_tables() {
    let (deals, contacts) = two_deals_one_contact();
    let server = mock_crm(deals, contacts).await;
    let warehouse = MemoryWarehouse::default();

    let stats = Pipeline::new(extractor(&server), Loader::new(warehouse.clone()))
        .run()
        .await
        .unwrap();

    assert_eq!(stats.deals_extracted, 2);
    assert_eq!(stats.contacts_extracted, 1);
    assert_eq!(stats.deals_loaded, 2);
    assert_eq!(stats.leads_loaded, 1);

    let tables = warehouse.tables.lock().unwrap();
    assert_eq!(tables.get(DEALS_TABLE), Some(&2));
    assert_eq!(tables.get(LEADS_TABLE), Some(&1));
    assert_eq!(*warehouse.closed_sessions.lock().unwrap(), 1);
}

#[tokio::test]
async fn load_failure_surfaces_after_session_is_closed() {
    let (deals, contacts) = two_deals_one_contact();
    let server = mock_crm(deals, contacts).await;
    let warehouse = MemoryWarehouse {
        fail_on: Some(DEALS_TABLE),
        ..Default::default()
    };

    let err = Pipeline::new(extractor(&server), Loader::new(warehouse.clone()))
        .run()
        .await
        .unwrap_err();

    match err {
        EtlError::Load(LoadError::Tables(failures)) => {
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].table, DEALS_TABLE);
        },
        other => panic!("expected a table load failure, got {other:?}"),
    }
    assert_eq!(warehouse.tables.lock().unwrap().get(LEADS_TABLE), Some(&1));
    assert_eq!(*warehouse.closed_sessions.lock().unwrap(), 1);
}

#[tokio::test]
async fn extraction_failure_never_opens_the_warehouse() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DEALS_PATH))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let warehouse = MemoryWarehouse::default();
    let result = Pipeline::new(extractor(&server), Loader::new(warehouse.clone()))
        .run()
        .await;

    assert!(matches!(result, Err(EtlError::ExternalFetch { .. })));
    assert_eq!(*warehouse.closed_sessions.lock().unwrap(), 0);
    assert!(warehouse.tables.lock().unwrap().is_empty());
}
