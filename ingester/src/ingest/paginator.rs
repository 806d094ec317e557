use super::{NoticePage, NoticeSource};
use crate::model::Notice;
use metrics::counter;
use tenders_core::telemetry::PAGES_FETCHED;
use tenders_core::{Error, ErrorPolicy, Result};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub number: u32,
    pub notices: Vec<Notice>,
    /// Entries the source could not decode into a notice.
    pub skipped: usize,
}

/// Cursor over the pages of one notice category. Pages are requested one at a
/// time starting at 1; the cursor ends on the first page with no entries or
/// once the caller calls [`NoticePaginator::stop`].
pub struct NoticePaginator<'a> {
    source: &'a dyn NoticeSource,
    category: &'a str,
    page_size: u32,
    policy: ErrorPolicy,
    next_page: u32,
    finished: bool,
}

impl<'a> NoticePaginator<'a> {
    pub fn new(
        source: &'a dyn NoticeSource,
        category: &'a str,
        page_size: u32,
        policy: ErrorPolicy,
    ) -> Self {
        Self {
            source,
            category,
            page_size,
            policy,
            next_page: 1,
            finished: false,
        }
    }

    /// No further pages will be requested.
    pub fn stop(&mut self) {
        self.finished = true;
    }

    pub fn pages_fetched(&self) -> u32 {
        self.next_page - 1
    }

    pub async fn next_page(&mut self) -> Result<Option<FetchedPage>> {
        if self.finished {
            return Ok(None);
        }

        let number = self.next_page;
        info!(
            category = self.category,
            page = number,
            "📦 Fetching page {} of '{}'...",
            number,
            self.category
        );

        let page = self
            .source
            .fetch_page(self.category, number, self.page_size)
            .await?;
        self.next_page += 1;
        counter!(PAGES_FETCHED, "category" => self.category.to_string()).increment(1);

        match page {
            NoticePage::Decoded { notices, skipped } if notices.len() + skipped > 0 => {
                Ok(Some(FetchedPage {
                    number,
                    notices,
                    skipped,
                }))
            }
            NoticePage::Decoded { .. } => {
                self.finished = true;
                Ok(None)
            }
            NoticePage::Malformed { details } => {
                self.finished = true;
                if self.policy == ErrorPolicy::Abort {
                    return Err(Error::Decode {
                        source_name: self.source.source_id().to_string(),
                        details: format!("{} page {}: {}", self.category, number, details),
                    });
                }
                // Indistinguishable from exhaustion from here on
                warn!(
                    category = self.category,
                    page = number,
                    details = %details,
                    "⚠️ Malformed notice page, ending category"
                );
                Ok(None)
            }
        }
    }
}
