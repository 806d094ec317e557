pub mod contracts_finder;
pub mod paginator;

use crate::model::Notice;
use async_trait::async_trait;
use tenders_core::Result;

/// One decoded page of upstream notices.
#[derive(Debug, Clone)]
pub enum NoticePage {
    Decoded {
        /// Notices in upstream order (newest first).
        notices: Vec<Notice>,
        /// List entries whose `item` was missing or did not decode.
        skipped: usize,
    },
    /// The page payload did not carry a notice list.
    Malformed { details: String },
}

impl NoticePage {
    /// Number of list entries on the page, decodable or not.
    pub fn entry_count(&self) -> usize {
        match self {
            NoticePage::Decoded { notices, skipped } => notices.len() + skipped,
            NoticePage::Malformed { .. } => 0,
        }
    }
}

#[async_trait]
pub trait NoticeSource: Send + Sync {
    /// Fetch one 1-indexed page of notices of the given type
    async fn fetch_page(&self, category: &str, page: u32, page_size: u32) -> Result<NoticePage>;

    /// Get the source identifier
    fn source_id(&self) -> &str;
}

pub use contracts_finder::ContractsFinderSource;
pub use paginator::NoticePaginator;
