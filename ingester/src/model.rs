use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Separator between title and buyer name inside an identity key.
pub const KEY_DELIMITER: &str = "|||";

/// One notice as published by Contracts Finder (the `item` of a `noticeList` entry).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    pub id: Option<String>,
    pub title: Option<String>,
    pub organisation_name: Option<String>,
    pub cpv_description: Option<String>,
    pub region: Option<String>,
    pub awarded_value: Option<f64>,
    pub value_low: Option<f64>,
    pub notice_status: Option<String>,
    pub published_date: Option<String>,
    pub deadline_date: Option<String>,
    #[serde(rename = "noticeURL")]
    pub notice_url: Option<String>,
    pub awarded_supplier: Option<String>,
}

/// Row shape written to the `tenders` table.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TenderRecord {
    pub id: Uuid,
    pub title: String,
    pub buyer_name: String,
    pub cpv_category: Option<String>,
    pub region: Option<String>,
    pub value_estimate: Option<f64>,
    pub status: Option<String>,
    pub closing_date: Option<String>,
    pub details_url: Option<String>,
    pub awarded_vendor: Option<String>,
    pub notice_type: String,
}

impl TenderRecord {
    pub fn identity_key(&self) -> IdentityKey {
        IdentityKey::new(&self.title, &self.buyer_name)
    }
}

/// (title, buyer name) pair used to detect tenders that are already stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityKey(String);

impl IdentityKey {
    pub fn new(title: &str, buyer_name: &str) -> Self {
        Self(format!("{}{}{}", title, KEY_DELIMITER, buyer_name))
    }

    /// Both halves must be present and non-empty to identify a tender.
    pub fn from_parts(title: Option<&str>, buyer_name: Option<&str>) -> Option<Self> {
        match (title, buyer_name) {
            (Some(title), Some(buyer)) if !title.is_empty() && !buyer.is_empty() => {
                Some(Self::new(title, buyer))
            }
            _ => None,
        }
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Projection of a stored tender used to seed the dedup index.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct KeyRow {
    pub title: Option<String>,
    pub buyer_name: Option<String>,
}

impl KeyRow {
    pub fn identity_key(&self) -> Option<IdentityKey> {
        IdentityKey::from_parts(self.title.as_deref(), self.buyer_name.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn notice_decodes_contracts_finder_field_names() {
        let notice: Notice = serde_json::from_value(serde_json::json!({
            "id": "a1b2",
            "title": "Road resurfacing",
            "organisationName": "Leeds City Council",
            "cpvDescription": "Road works",
            "region": "Yorkshire and the Humber",
            "awardedValue": null,
            "valueLow": 12000.0,
            "noticeStatus": "Open",
            "publishedDate": "2026-10-15T09:00:00Z",
            "deadlineDate": "2026-11-01T12:00:00Z",
            "noticeURL": "https://example.test/notice/a1b2",
            "awardedSupplier": null,
            "valueHigh": 20000.0
        }))
        .unwrap();

        assert_eq!(notice.organisation_name.as_deref(), Some("Leeds City Council"));
        assert_eq!(notice.awarded_value, None);
        assert_eq!(notice.value_low, Some(12000.0));
        assert_eq!(notice.notice_url.as_deref(), Some("https://example.test/notice/a1b2"));
    }

    #[test]
    fn identity_key_joins_title_and_buyer() {
        let key = IdentityKey::new("Road resurfacing", "Leeds City Council");
        assert_eq!(key.to_string(), "Road resurfacing|||Leeds City Council");
    }

    #[test]
    fn key_rows_without_both_halves_have_no_identity() {
        let row = KeyRow {
            title: Some("Road resurfacing".to_string()),
            buyer_name: None,
        };
        assert_eq!(row.identity_key(), None);

        let row = KeyRow {
            title: Some(String::new()),
            buyer_name: Some("Leeds City Council".to_string()),
        };
        assert_eq!(row.identity_key(), None);
    }

    #[test]
    fn record_serializes_absent_optionals_as_null() {
        let record = TenderRecord {
            id: Uuid::nil(),
            title: "Road resurfacing".to_string(),
            buyer_name: "Leeds City Council".to_string(),
            cpv_category: None,
            region: None,
            value_estimate: None,
            status: Some("Open".to_string()),
            closing_date: None,
            details_url: None,
            awarded_vendor: None,
            notice_type: "Opportunity".to_string(),
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["value_estimate"], serde_json::Value::Null);
        assert_eq!(json["awarded_vendor"], serde_json::Value::Null);
        assert_eq!(json["notice_type"], "Opportunity");
        assert_eq!(json["id"], "00000000-0000-0000-0000-000000000000");
    }
}
