//! CRM extraction against a mock HubSpot API

use dealflow_etl::config::CrmConfig;
use dealflow_etl::hubspot::{CrmExtractor, ASSOCIATIONS, CONTACTS_PATH, DEALS_PATH, PROPERTIES};
use dealflow_etl::EtlError;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn extractor_for(server: &MockServer) -> CrmExtractor {
    CrmExtractor::new(CrmConfig::new("test-token").with_base_url(server.uri()))
        .expect("extractor should build")
}

#[tokio::test]
async fn fetch_sends_projection_and_bearer_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(DEALS_PATH))
        .and(header("authorization", "Bearer test-token"))
        .and(query_param("properties", PROPERTIES))
        .and(query_param("associations", ASSOCIATIONS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{
                "id": "1",
                "properties": { "dealname": "Alpha", "amount": "100" },
                "associations": { "companies": { "results": [{ "id": "42", "type": "deal_to_company" }] } }
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(CONTACTS_PATH))
        .and(header("authorization", "Bearer test-token"))
        .and(query_param("properties", PROPERTIES))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                { "id": "7", "properties": { "email": "ana@example.com" } },
                { "id": "8", "properties": { "email": "ben@example.com", "hs_lead_status": "NEW" } }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let extracted = extractor_for(&server).fetch().await.expect("fetch should succeed");

    assert_eq!(extracted.deals.len(), 1);
    assert_eq!(extracted.deals[0].first_company_id(), Some("42"));
    assert_eq!(extracted.contacts.len(), 2);
    assert_eq!(extracted.contacts[1].properties.hs_lead_status.as_deref(), Some("NEW"));
}

#[tokio::test]
async fn non_success_status_fails_fast() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(DEALS_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "status": "error",
            "message": "Authentication credentials not found."
        })))
        .mount(&server)
        .await;

    // Contacts must never be requested once deals failed.
    Mock::given(method("GET"))
        .and(path(CONTACTS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": [] })))
        .expect(0)
        .mount(&server)
        .await;

    let err = extractor_for(&server).fetch().await.unwrap_err();

    match err {
        EtlError::ExternalFetch { url, status } => {
            assert_eq!(status.as_u16(), 401);
            assert!(url.ends_with(DEALS_PATH));
        },
        other => panic!("expected ExternalFetch, got {other:?}"),
    }
}

#[tokio::test]
async fn contacts_failure_discards_deals() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(DEALS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": [] })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(CONTACTS_PATH))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = extractor_for(&server).fetch().await.unwrap_err();
    assert!(matches!(err, EtlError::ExternalFetch { status, .. } if status.as_u16() == 503));
}

#[tokio::test]
async fn trailing_slash_in_base_url_is_tolerated() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(DEALS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": [] })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(CONTACTS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": [] })))
        .mount(&server)
        .await;

    let config = CrmConfig::new("t").with_base_url(format!("{}/", server.uri()));
    let extracted = CrmExtractor::new(config).unwrap().fetch().await.unwrap();

    assert!(extracted.deals.is_empty());
    assert!(extracted.contacts.is_empty());
}

#[tokio::test]
async fn malformed_records_degrade_without_losing_the_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(DEALS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                {
                    "id": "d-1",
                    "properties": { "dealname": "Alpha", "amount": "100" },
                    "associations": { "companies": { "results": [{ "id": "42" }, { "id": null }] } }
                },
                { "id": "d-2", "properties": null },
                { "id": 3, "properties": { "amount": 50 } }
            ]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(CONTACTS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{ "id": "7", "properties": "oops" }]
        })))
        .mount(&server)
        .await;

    let extracted = extractor_for(&server).fetch().await.expect("fetch should succeed");

    assert_eq!(extracted.deals.len(), 3);
    assert_eq!(extracted.deals[0].first_company_id(), Some("42"));
    assert_eq!(extracted.deals[1].id, "d-2");
    assert_eq!(extracted.deals[1].properties.dealname, None);
    assert_eq!(extracted.deals[2].id, "3");
    assert_eq!(extracted.deals[2].properties.amount.as_deref(), Some("50"));
    assert_eq!(extracted.contacts.len(), 1);
    assert_eq!(extracted.contacts[0].properties.email, None);
}
