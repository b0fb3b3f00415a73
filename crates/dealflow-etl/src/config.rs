//! ETL configuration

use crate::{EtlError, Result};
use dealflow_common::{env, warehouse::WarehouseConfig};
use serde::{Deserialize, Serialize};

/// Default CRM API origin.
pub const DEFAULT_CRM_BASE_URL: &str = "https://api.hubapi.com";

/// Default CRM request timeout in seconds.
pub const DEFAULT_CRM_TIMEOUT_SECS: u64 = 30;

/// Settings for the CRM read API
#[derive(Clone, Serialize, Deserialize)]
pub struct CrmConfig {
    /// Origin the object endpoints are resolved against
    pub base_url: String,

    /// Private-app bearer token
    pub access_token: String,

    pub timeout_secs: u64,
}

impl std::fmt::Debug for CrmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrmConfig")
            .field("base_url", &self.base_url)
            .field("access_token", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl CrmConfig {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_CRM_BASE_URL.to_string(),
            access_token: access_token.into(),
            timeout_secs: DEFAULT_CRM_TIMEOUT_SECS,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Read `HUBSPOT_ACCESS_TOKEN` (or the older `HUBSPOT_API_KEY`),
    /// `HUBSPOT_BASE_URL` and `HUBSPOT_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        let access_token = env::first_non_empty(&["HUBSPOT_ACCESS_TOKEN", "HUBSPOT_API_KEY"])
            .ok_or_else(|| EtlError::Config("HUBSPOT_ACCESS_TOKEN must be set".to_string()))?;

        let config = Self {
            base_url: env::string_or("HUBSPOT_BASE_URL", DEFAULT_CRM_BASE_URL),
            access_token,
            timeout_secs: env::parse_or("HUBSPOT_TIMEOUT_SECS", DEFAULT_CRM_TIMEOUT_SECS),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(EtlError::Config("CRM base URL cannot be empty".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(EtlError::Config("CRM timeout must be greater than 0".to_string()));
        }
        Ok(())
    }
}

/// Full pipeline configuration
#[derive(Debug, Clone)]
pub struct EtlConfig {
    pub crm: CrmConfig,
    pub warehouse: WarehouseConfig,
}

impl EtlConfig {
    /// Load `.env` if present, then read both sections from the environment.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            crm: CrmConfig::from_env()?,
            warehouse: WarehouseConfig::from_env()?,
        })
    }
}
