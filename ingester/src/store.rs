use crate::model::{KeyRow, TenderRecord};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use tenders_core::config::StoreConfig;
use tenders_core::{Error, Result};
use tracing::{debug, instrument};

/// One page of the (title, buyer_name) projection.
#[derive(Debug, Clone)]
pub enum KeyPage {
    Rows(Vec<KeyRow>),
    /// The store answered with a non-success status.
    Failed { status: u16, body: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// The store answered with a non-success status; nothing is assumed written.
    Rejected { status: u16, body: String },
}

/// Downstream tender table. Transport failures are `Err`, store-side refusals are values.
#[async_trait]
pub trait TenderStore: Send + Sync {
    async fn fetch_key_page(&self, offset: usize, limit: usize) -> Result<KeyPage>;

    async fn insert_tenders(&self, records: &[TenderRecord]) -> Result<InsertOutcome>;

    fn store_id(&self) -> &str;
}

/// PostgREST endpoint for the tenders table (a Supabase project in production).
pub struct RestStore {
    client: reqwest::Client,
    table_url: String,
    headers: HeaderMap,
}

impl RestStore {
    pub fn new(client: reqwest::Client, config: &StoreConfig) -> Result<Self> {
        let key = HeaderValue::from_str(&config.service_key)
            .map_err(|e| Error::Config(format!("store.service_key is not a valid header: {}", e)))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", config.service_key))
            .map_err(|e| Error::Config(format!("store.service_key is not a valid header: {}", e)))?;

        let mut headers = HeaderMap::new();
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Ok(Self {
            client,
            table_url: format!(
                "{}/rest/v1/{}",
                config.url.trim_end_matches('/'),
                config.table
            ),
            headers,
        })
    }
}

#[async_trait]
impl TenderStore for RestStore {
    #[instrument(skip(self))]
    async fn fetch_key_page(&self, offset: usize, limit: usize) -> Result<KeyPage> {
        let resp = self
            .client
            .get(&self.table_url)
            .headers(self.headers.clone())
            .query(&[
                ("select", "title,buyer_name".to_string()),
                ("offset", offset.to_string()),
                ("limit", limit.to_string()),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Ok(KeyPage::Failed {
                status: status.as_u16(),
                body,
            });
        }

        let rows: Vec<KeyRow> = resp.json().await?;
        debug!(offset, rows = rows.len(), "Fetched stored tender keys");
        Ok(KeyPage::Rows(rows))
    }

    #[instrument(skip(self, records), fields(count = records.len()))]
    async fn insert_tenders(&self, records: &[TenderRecord]) -> Result<InsertOutcome> {
        let resp = self
            .client
            .post(&self.table_url)
            .headers(self.headers.clone())
            .header("Prefer", "return=minimal")
            .json(records)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Ok(InsertOutcome::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(InsertOutcome::Inserted)
    }

    fn store_id(&self) -> &str {
        &self.table_url
    }
}
