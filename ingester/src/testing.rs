//! In-memory stand-ins for the notice source and the tender store.

use crate::ingest::{NoticePage, NoticeSource};
use crate::model::{KeyRow, Notice, TenderRecord};
use crate::store::{InsertOutcome, KeyPage, TenderStore};
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use tenders_core::{Error, Result};

pub fn run_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap()
}

/// A notice published `days_old` days before [`run_at`].
/// A reqwest failure raised before any bytes hit the network.
pub fn transport_error() -> Error {
    match reqwest::Client::new().get("not a url").build() {
        Err(e) => Error::Http(e),
        Ok(_) => unreachable!("an unparseable URL never builds a request"),
    }
}

pub fn notice(title: &str, buyer: &str, days_old: i64) -> Notice {
    let published = run_at() - Duration::days(days_old);
    Notice {
        id: Some(format!("{}-{}", title, buyer).replace(' ', "-")),
        title: Some(title.to_string()),
        organisation_name: Some(buyer.to_string()),
        cpv_description: Some("Construction work".to_string()),
        region: Some("London".to_string()),
        awarded_value: None,
        value_low: Some(1000.0),
        notice_status: Some("Open".to_string()),
        published_date: Some(published.to_rfc3339()),
        deadline_date: None,
        notice_url: None,
        awarded_supplier: None,
    }
}

enum Scripted {
    Notices(Vec<Notice>),
    Undecodable(usize),
    Malformed,
    TransportFailure,
}

/// Replays scripted pages per category; once a category's script runs out it
/// answers with empty pages.
#[derive(Default)]
pub struct ScriptedSource {
    scripts: Mutex<HashMap<String, VecDeque<Scripted>>>,
    requests: Mutex<Vec<(String, u32, u32)>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(self, category: &str, step: Scripted) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .entry(category.to_string())
            .or_default()
            .push_back(step);
        self
    }

    pub fn page(self, category: &str, notices: Vec<Notice>) -> Self {
        self.push(category, Scripted::Notices(notices))
    }

    pub fn undecodable_page(self, category: &str, entries: usize) -> Self {
        self.push(category, Scripted::Undecodable(entries))
    }

    pub fn malformed_page(self, category: &str) -> Self {
        self.push(category, Scripted::Malformed)
    }

    pub fn transport_failure(self, category: &str) -> Self {
        self.push(category, Scripted::TransportFailure)
    }

    /// Every (category, page, page size) requested so far.
    pub fn requests(&self) -> Vec<(String, u32, u32)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl NoticeSource for ScriptedSource {
    async fn fetch_page(&self, category: &str, page: u32, page_size: u32) -> Result<NoticePage> {
        self.requests
            .lock()
            .unwrap()
            .push((category.to_string(), page, page_size));

        let step = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(category)
            .and_then(VecDeque::pop_front);

        match step {
            Some(Scripted::Notices(notices)) => Ok(NoticePage::Decoded {
                notices,
                skipped: 0,
            }),
            Some(Scripted::Undecodable(skipped)) => Ok(NoticePage::Decoded {
                notices: Vec::new(),
                skipped,
            }),
            Some(Scripted::Malformed) => Ok(NoticePage::Malformed {
                details: "noticeList is missing or not a list".to_string(),
            }),
            Some(Scripted::TransportFailure) => Err(transport_error()),
            None => Ok(NoticePage::Decoded {
                notices: Vec::new(),
                skipped: 0,
            }),
        }
    }

    fn source_id(&self) -> &str {
        "scripted"
    }
}

/// Tender table kept in memory. Successful inserts become visible to later key reads.
#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<KeyRow>>,
    inserted: Mutex<Vec<TenderRecord>>,
    batches: Mutex<Vec<usize>>,
    key_page_offsets: Mutex<Vec<usize>>,
    fail_key_reads_from: Option<usize>,
    rejected_batches: HashSet<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<KeyRow>) -> Self {
        Self {
            rows: Mutex::new(rows),
            ..Self::default()
        }
    }

    pub fn with_tenders(pairs: &[(&str, &str)]) -> Self {
        Self::with_rows(
            pairs
                .iter()
                .map(|(title, buyer)| KeyRow {
                    title: Some(title.to_string()),
                    buyer_name: Some(buyer.to_string()),
                })
                .collect(),
        )
    }

    /// Key reads at or beyond `offset` answer 503.
    pub fn failing_key_reads_from(mut self, offset: usize) -> Self {
        self.fail_key_reads_from = Some(offset);
        self
    }

    /// The `n`-th insert request (0-based) is refused.
    pub fn rejecting_batch(mut self, n: usize) -> Self {
        self.rejected_batches.insert(n);
        self
    }

    pub fn inserted(&self) -> Vec<TenderRecord> {
        self.inserted.lock().unwrap().clone()
    }

    /// Size of every insert request, accepted or not.
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches.lock().unwrap().clone()
    }

    pub fn key_page_offsets(&self) -> Vec<usize> {
        self.key_page_offsets.lock().unwrap().clone()
    }
}

#[async_trait]
impl TenderStore for MemoryStore {
    async fn fetch_key_page(&self, offset: usize, limit: usize) -> Result<KeyPage> {
        self.key_page_offsets.lock().unwrap().push(offset);

        if self.fail_key_reads_from.is_some_and(|from| offset >= from) {
            return Ok(KeyPage::Failed {
                status: 503,
                body: "service unavailable".to_string(),
            });
        }

        let rows = self.rows.lock().unwrap();
        Ok(KeyPage::Rows(
            rows.iter().skip(offset).take(limit).cloned().collect(),
        ))
    }

    async fn insert_tenders(&self, records: &[TenderRecord]) -> Result<InsertOutcome> {
        let n = {
            let mut batches = self.batches.lock().unwrap();
            batches.push(records.len());
            batches.len() - 1
        };

        if self.rejected_batches.contains(&n) {
            return Ok(InsertOutcome::Rejected {
                status: 409,
                body: r#"{"message":"duplicate key value"}"#.to_string(),
            });
        }

        let mut rows = self.rows.lock().unwrap();
        rows.extend(records.iter().map(|r| KeyRow {
            title: Some(r.title.clone()),
            buyer_name: Some(r.buyer_name.clone()),
        }));
        self.inserted.lock().unwrap().extend_from_slice(records);
        Ok(InsertOutcome::Inserted)
    }

    fn store_id(&self) -> &str {
        "memory"
    }
}
