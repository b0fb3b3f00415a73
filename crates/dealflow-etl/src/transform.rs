//! Flatten CRM objects into warehouse rows.
//!
//! Pure functions only. A malformed field degrades to its default and never
//! drops the record or aborts the batch.

use crate::hubspot::{HubSpotContact, HubSpotDeal};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use dealflow_common::types::{DealRow, LeadRow, UNKNOWN_LEAD_STATUS};

/// Transformed tables ready for loading
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transformed {
    pub deals: Vec<DealRow>,
    pub leads: Vec<LeadRow>,
}

pub fn transform(deals: &[HubSpotDeal], contacts: &[HubSpotContact]) -> Transformed {
    Transformed {
        deals: deals.iter().map(deal_row).collect(),
        leads: contacts.iter().map(lead_row).collect(),
    }
}

pub fn deal_row(deal: &HubSpotDeal) -> DealRow {
    let props = &deal.properties;

    DealRow {
        deal_id: deal.id.clone(),
        deal_name: props.dealname.clone(),
        amount: parse_amount(props.amount.as_deref()),
        stage: props.dealstage.clone(),
        created_at: props.createdate.as_deref().and_then(parse_timestamp),
        associated_company_id: deal.first_company_id().map(str::to_string),
    }
}

pub fn lead_row(contact: &HubSpotContact) -> LeadRow {
    let props = &contact.properties;

    LeadRow {
        lead_id: contact.id.clone(),
        email: props.email.clone(),
        first_name: props.firstname.clone(),
        last_name: props.lastname.clone(),
        status: props
            .hs_lead_status
            .clone()
            .filter(|status| !status.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_LEAD_STATUS.to_string()),
        created_at: props.createdate.as_deref().and_then(parse_timestamp),
    }
}

/// Non-negative finite amount; anything else is 0.
pub fn parse_amount(raw: Option<&str>) -> f64 {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|amount| amount.is_finite() && *amount >= 0.0)
        .unwrap_or(0.0)
}

/// HubSpot sends RFC 3339 timestamps, millisecond epochs for some legacy
/// properties, and bare dates for date-typed properties.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(millis) = raw.parse::<i64>() {
        return DateTime::from_timestamp_millis(millis);
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hubspot::{ContactProperties, CrmObject};
    use chrono::TimeZone;
    use serde_json::json;

    fn deal(value: serde_json::Value) -> HubSpotDeal {
        serde_json::from_value(value).unwrap()
    }

    fn contact(properties: ContactProperties) -> HubSpotContact {
        CrmObject {
            id: "c-1".to_string(),
            properties,
            associations: None,
            created_at: None,
            updated_at: None,
            archived: false,
        }
    }

    #[test]
    fn deal_with_company_association_keeps_first_id() {
        let row = deal_row(&deal(json!({
            "id": "d-1",
            "properties": { "dealname": "Big one", "amount": "1200", "dealstage": "won" },
            "associations": {
                "companies": { "results": [{ "id": "42" }, { "id": "43" }] }
            }
        })));

        assert_eq!(row.deal_id, "d-1");
        assert_eq!(row.associated_company_id.as_deref(), Some("42"));
        assert_eq!(row.amount, 1200.0);
        assert_eq!(row.stage.as_deref(), Some("won"));
    }

    #[test]
    fn deal_without_associations_has_no_company() {
        let row = deal_row(&deal(json!({ "id": "d-2", "properties": {} })));
        assert_eq!(row.associated_company_id, None);
        assert_eq!(row.amount, 0.0);
    }

    #[test]
    fn amount_coercion() {
        assert_eq!(parse_amount(Some("not_a_number")), 0.0);
        assert_eq!(parse_amount(None), 0.0);
        assert_eq!(parse_amount(Some("-15")), 0.0);
        assert_eq!(parse_amount(Some("NaN")), 0.0);
        assert_eq!(parse_amount(Some(" 99.5 ")), 99.5);
    }

    #[test]
    fn contact_without_status_is_unknown() {
        let row = lead_row(&contact(ContactProperties {
            email: Some("ana@example.com".to_string()),
            ..Default::default()
        }));

        assert_eq!(row.status, UNKNOWN_LEAD_STATUS);
        assert_eq!(row.email.as_deref(), Some("ana@example.com"));
        assert_eq!(row.lead_id, "c-1");
    }

    #[test]
    fn contact_status_is_kept_when_present() {
        let row = lead_row(&contact(ContactProperties {
            hs_lead_status: Some("NEW".to_string()),
            ..Default::default()
        }));
        assert_eq!(row.status, "NEW");
    }

    #[test]
    fn timestamps_in_supported_shapes() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();

        assert_eq!(parse_timestamp("2024-03-01T10:00:00.000Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01T10:00:00"), Some(expected));
        assert_eq!(parse_timestamp("1709287200000"), Some(expected));
        assert_eq!(
            parse_timestamp("2024-03-01"),
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn malformed_fields_do_not_drop_records() {
        let deals = vec![
            deal(json!({ "id": "d-1", "properties": { "amount": "oops", "createdate": "never" } })),
            deal(json!({ "id": "d-2", "properties": { "amount": "10" } })),
        ];

        let out = transform(&deals, &[]);
        assert_eq!(out.deals.len(), 2);
        assert_eq!(out.deals[0].amount, 0.0);
        assert_eq!(out.deals[0].created_at, None);
        assert!(out.leads.is_empty());
    }
}
