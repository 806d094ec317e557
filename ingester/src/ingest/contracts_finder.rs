use super::{NoticePage, NoticeSource};
use crate::model::Notice;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tenders_core::Result;
use tracing::{debug, instrument};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest<'a> {
    notice_type: &'a str,
    page: u32,
    page_size: u32,
}

/// Contracts Finder `search_notices/json` endpoint.
pub struct ContractsFinderSource {
    client: reqwest::Client,
    search_url: String,
}

impl ContractsFinderSource {
    pub fn new(client: reqwest::Client, search_url: String) -> Self {
        Self { client, search_url }
    }
}

#[async_trait]
impl NoticeSource for ContractsFinderSource {
    #[instrument(skip(self))]
    async fn fetch_page(&self, category: &str, page: u32, page_size: u32) -> Result<NoticePage> {
        let request = SearchRequest {
            notice_type: category,
            page,
            page_size,
        };

        let resp = self
            .client
            .post(&self.search_url)
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            return Ok(NoticePage::Malformed {
                details: format!("status {}: {}", status.as_u16(), truncate(&body, 512)),
            });
        }

        let page_data = decode_page(&body);
        debug!(
            entries = page_data.entry_count(),
            "Decoded notice page"
        );
        Ok(page_data)
    }

    fn source_id(&self) -> &str {
        "contracts_finder"
    }
}

/// Decode a search response body. Entries are decoded one at a time so a single
/// odd entry does not cost the rest of the page.
pub fn decode_page(body: &str) -> NoticePage {
    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => {
            return NoticePage::Malformed {
                details: format!("body is not JSON: {}", e),
            }
        }
    };

    let Some(entries) = value.get("noticeList").and_then(Value::as_array) else {
        return NoticePage::Malformed {
            details: "noticeList is missing or not a list".to_string(),
        };
    };

    let mut notices = Vec::with_capacity(entries.len());
    let mut skipped = 0;

    for entry in entries {
        match entry.get("item").filter(|item| item.is_object()) {
            Some(item) => match serde_json::from_value::<Notice>(item.clone()) {
                Ok(notice) => notices.push(notice),
                Err(e) => {
                    debug!(error = %e, "Skipping undecodable notice");
                    skipped += 1;
                }
            },
            None => skipped += 1,
        }
    }

    NoticePage::Decoded { notices, skipped }
}

fn truncate(body: &str, max: usize) -> &str {
    match body.char_indices().nth(max) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
