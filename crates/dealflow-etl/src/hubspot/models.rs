//! Typed views of HubSpot CRM v3 object responses.
//!
//! The read API wraps every collection in `{"results": [...]}` and every
//! object in the same envelope, so both are generic over the item and the
//! property set. Ids, property sets, property values and associations are
//! decoded leniently: a field with an unexpected shape falls back to its
//! default instead of failing the page.

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One page of an object listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrmPage<T> {
    pub results: Vec<T>,
}

/// A CRM object envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(
    rename_all = "camelCase",
    bound(deserialize = "P: DeserializeOwned + Default")
)]
pub struct CrmObject<P> {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub properties: P,
    #[serde(default, deserialize_with = "lenient")]
    pub associations: Option<Associations>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub archived: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Associations {
    #[serde(default, deserialize_with = "lenient")]
    pub companies: Option<AssociationGroup>,
    #[serde(default, deserialize_with = "lenient")]
    pub contacts: Option<AssociationGroup>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssociationGroup {
    /// Entries that failed to decode are dropped; the rest keep their order.
    #[serde(default, deserialize_with = "lenient_list")]
    pub results: Vec<AssociationRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssociationRef {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DealProperties {
    #[serde(default, deserialize_with = "lenient_string")]
    pub dealname: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub amount: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub dealstage: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub createdate: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactProperties {
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub firstname: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub lastname: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub hs_lead_status: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub createdate: Option<String>,
}

pub type HubSpotDeal = CrmObject<DealProperties>;
pub type HubSpotContact = CrmObject<ContactProperties>;

impl HubSpotDeal {
    /// Id of the first associated company, if any.
    pub fn first_company_id(&self) -> Option<&str> {
        self.associations
            .as_ref()?
            .companies
            .as_ref()?
            .results
            .first()
            .map(|company| company.id.as_str())
    }
}

/// Decode `T`, or `None` when the value is null or shaped differently.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Decode `T`, falling back to `T::default()` for null or foreign shapes.
fn lenient_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(lenient(deserializer)?.unwrap_or_default())
}

/// Keep every element of an array that decodes as `T`.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

/// Object ids as text; an unusable id becomes empty.
fn lenient_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_string(deserializer)?.unwrap_or_default())
}

/// Accept strings, numbers and booleans as text; anything else is `None`.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

/// Association ids arrive as strings, but numeric ids are accepted too.
fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected an association id, got {other}"
        ))),
    }
}
