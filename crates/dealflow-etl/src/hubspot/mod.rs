//! HubSpot CRM extraction
//!
//! Two independent GETs against the CRM v3 objects API (deals and contacts),
//! each with the same fixed property and association projection. Only the
//! first page is read. Any non-2xx status fails the whole extraction.

pub mod models;

pub use models::{
    AssociationGroup, AssociationRef, Associations, ContactProperties, CrmObject, CrmPage,
    DealProperties, HubSpotContact, HubSpotDeal,
};

use crate::config::CrmConfig;
use crate::{EtlError, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info};

pub const DEALS_PATH: &str = "/crm/v3/objects/deals";
pub const CONTACTS_PATH: &str = "/crm/v3/objects/contacts";

/// Properties requested for both object types
pub const PROPERTIES: &str =
    "dealname,amount,dealstage,createdate,email,firstname,lastname,hs_lead_status";

/// Associations requested for both object types
pub const ASSOCIATIONS: &str = "company,contact";

/// Raw records pulled from the CRM
#[derive(Debug, Clone, Default)]
pub struct Extracted {
    pub deals: Vec<HubSpotDeal>,
    pub contacts: Vec<HubSpotContact>,
}

/// HTTP client for the CRM read API
pub struct CrmExtractor {
    client: Client,
    config: CrmConfig,
}

impl CrmExtractor {
    pub fn new(config: CrmConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent("Dealflow-ETL/1.0")
            .build()?;

        Ok(Self { client, config })
    }

    /// Fetch deals, then contacts.
    #[tracing::instrument(skip(self), fields(base_url = %self.config.base_url))]
    pub async fn fetch(&self) -> Result<Extracted> {
        let deals: Vec<HubSpotDeal> = self.fetch_objects(DEALS_PATH).await?;
        let contacts: Vec<HubSpotContact> = self.fetch_objects(CONTACTS_PATH).await?;

        info!(deals = deals.len(), contacts = contacts.len(), "Extracted CRM records");

        Ok(Extracted { deals, contacts })
    }

    async fn fetch_objects<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), path);
        debug!(url = %url, "Requesting CRM objects");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.config.access_token)
            .query(&[("properties", PROPERTIES), ("associations", ASSOCIATIONS)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(EtlError::ExternalFetch { url, status });
        }

        let page: CrmPage<T> = response.json().await?;
        Ok(page.results)
    }
}
