use crate::model::IdentityKey;
use crate::store::{KeyPage, TenderStore};
use std::collections::HashSet;
use tenders_core::{Error, ErrorPolicy, Result};
use tracing::{info, instrument, warn};

/// Identity keys of every tender known to this run: those already stored plus
/// those accepted since the run started.
#[derive(Debug, Default, Clone)]
pub struct DedupIndex {
    keys: HashSet<IdentityKey>,
}

impl DedupIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Walk the stored (title, buyer_name) projection by offset until a short or
    /// empty page. A store refusal ends the walk with the keys gathered so far
    /// unless the policy says to abort.
    #[instrument(skip(store))]
    pub async fn load(
        store: &dyn TenderStore,
        page_size: usize,
        policy: ErrorPolicy,
    ) -> Result<Self> {
        let mut index = Self::new();
        let mut offset = 0usize;
        let mut skipped_rows = 0usize;

        loop {
            let rows = match store.fetch_key_page(offset, page_size).await? {
                KeyPage::Rows(rows) => rows,
                KeyPage::Failed { status, body } => {
                    if policy == ErrorPolicy::Abort {
                        return Err(Error::StoreRead { status, body });
                    }
                    warn!(
                        status,
                        body = %body,
                        offset,
                        known = index.len(),
                        "⚠️ Could not read stored tenders, continuing with a partial index"
                    );
                    break;
                }
            };

            if rows.is_empty() {
                break;
            }

            let fetched = rows.len();
            for row in &rows {
                match row.identity_key() {
                    Some(key) => {
                        index.keys.insert(key);
                    }
                    None => skipped_rows += 1,
                }
            }

            if fetched < page_size {
                break;
            }
            offset += page_size;
        }

        if index.is_empty() {
            warn!("No stored tender keys loaded, every notice will be treated as new");
        }

        info!(
            known = index.len(),
            skipped_rows,
            store = store.store_id(),
            "Loaded existing tender keys"
        );

        Ok(index)
    }

    pub fn contains(&self, key: &IdentityKey) -> bool {
        self.keys.contains(key)
    }

    /// Returns `false` if the key was already present.
    pub fn insert(&mut self, key: IdentityKey) -> bool {
        self.keys.insert(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl FromIterator<IdentityKey> for DedupIndex {
    fn from_iter<I: IntoIterator<Item = IdentityKey>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}
