use crate::dedup::DedupIndex;
use crate::filter::{cutoff_for, NoticeFilter, Verdict};
use crate::ingest::{NoticePaginator, NoticeSource};
use crate::store::TenderStore;
use crate::writer::BatchWriter;
use chrono::{DateTime, Utc};
use metrics::counter;
use std::sync::Arc;
use std::time::Instant;
use tenders_core::telemetry::{NOTICES_ACCEPTED, NOTICES_DUPLICATE, NOTICES_MALFORMED};
use tenders_core::{Config, Result};
use tracing::{debug, error, info, instrument, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryStats {
    pub category: String,
    pub pages_fetched: u32,
    /// Notices handed to the filter.
    pub evaluated: usize,
    pub accepted: usize,
    pub duplicates: usize,
    pub malformed: usize,
    /// Page entries the source could not decode.
    pub undecodable: usize,
    pub inserted: usize,
    pub failed_batches: usize,
    /// Paging ended on a notice older than the cutoff.
    pub reached_cutoff: bool,
}

impl CategoryStats {
    fn new(category: &str) -> Self {
        Self {
            category: category.to_string(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_at: DateTime<Utc>,
    pub cutoff: DateTime<Utc>,
    pub known_before_run: usize,
    pub categories: Vec<CategoryStats>,
}

impl RunSummary {
    pub fn total_inserted(&self) -> usize {
        self.categories.iter().map(|c| c.inserted).sum()
    }

    #[cfg(test)]
    pub fn category(&self, name: &str) -> Option<&CategoryStats> {
        self.categories.iter().find(|c| c.category == name)
    }
}

pub struct Pipeline {
    source: Arc<dyn NoticeSource>,
    store: Arc<dyn TenderStore>,
    config: Config,
}

impl Pipeline {
    pub fn new(source: Arc<dyn NoticeSource>, store: Arc<dyn TenderStore>, config: Config) -> Self {
        Self {
            source,
            store,
            config,
        }
    }

    /// Mirror every notice published within the window before `run_at` that the
    /// store does not already hold.
    #[instrument(skip(self))]
    pub async fn run(&self, run_at: DateTime<Utc>) -> Result<RunSummary> {
        let started = Instant::now();
        let cutoff = cutoff_for(run_at, self.config.ingest.window_days)?;
        let policy = self.config.ingest.error_policy;

        let mut index = DedupIndex::load(
            self.store.as_ref(),
            self.config.store.key_page_size,
            policy,
        )
        .await?;

        let filter = NoticeFilter::new(cutoff, self.config.source.notice_base_url.clone());
        let writer = BatchWriter::new(Arc::clone(&self.store));

        let mut summary = RunSummary {
            run_at,
            cutoff,
            known_before_run: index.len(),
            categories: Vec::with_capacity(self.config.ingest.categories.len()),
        };

        info!(
            cutoff = %filter.cutoff(),
            known = summary.known_before_run,
            "Starting tender ingestion"
        );

        for category in &self.config.ingest.categories {
            match self.ingest_category(category, &filter, &writer, &mut index).await {
                Ok(stats) => summary.categories.push(stats),
                Err(e) => {
                    error!(
                        category = %category,
                        inserted_so_far = summary.total_inserted(),
                        error = %e,
                        "❌ Ingestion aborted"
                    );
                    return Err(e);
                }
            }
        }

        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "✅ Inserted {} recent tenders ({}).",
            summary.total_inserted(),
            self.config.ingest.categories.join(" + ")
        );

        Ok(summary)
    }

    async fn ingest_category(
        &self,
        category: &str,
        filter: &NoticeFilter,
        writer: &BatchWriter,
        index: &mut DedupIndex,
    ) -> Result<CategoryStats> {
        let mut stats = CategoryStats::new(category);
        let mut pages = NoticePaginator::new(
            self.source.as_ref(),
            category,
            self.config.source.page_size,
            self.config.ingest.error_policy,
        );

        info!(category, "🔍 Fetching '{}' tenders...", category);

        while let Some(page) = pages.next_page().await? {
            stats.undecodable += page.skipped;
            let mut batch = Vec::new();

            for notice in &page.notices {
                stats.evaluated += 1;
                match filter.evaluate(notice, category, index) {
                    Verdict::Accept(record) => {
                        debug!(key = %record.identity_key(), "Reserved identity key");
                        info!(
                            "→ Insert: {} | Buyer: {} | Type: {}",
                            record.title, record.buyer_name, category
                        );
                        batch.push(record);
                    }
                    Verdict::Duplicate => {
                        stats.duplicates += 1;
                        info!(
                            "⚠️ Duplicate found. Skipping: {} ({})",
                            notice.title.as_deref().unwrap_or_default(),
                            notice.organisation_name.as_deref().unwrap_or_default()
                        );
                    }
                    Verdict::Malformed(reason) => {
                        stats.malformed += 1;
                        debug!(?reason, id = ?notice.id, "Skipping malformed notice");
                    }
                    Verdict::Stop => {
                        stats.reached_cutoff = true;
                        break;
                    }
                }
            }

            stats.accepted += batch.len();
            counter!(NOTICES_ACCEPTED, "category" => category.to_string()).increment(batch.len() as u64);

            if !batch.is_empty() {
                if writer.write(&batch).await? {
                    stats.inserted += batch.len();
                } else {
                    stats.failed_batches += 1;
                    warn!(
                        category,
                        page = page.number,
                        lost = batch.len(),
                        "Batch not inserted; its tenders stay marked as seen for this run"
                    );
                }
            }

            if stats.reached_cutoff {
                debug!(category, page = page.number, "Reached recency cutoff");
                pages.stop();
            }
        }

        stats.pages_fetched = pages.pages_fetched();
        counter!(NOTICES_DUPLICATE, "category" => category.to_string()).increment(stats.duplicates as u64);
        counter!(NOTICES_MALFORMED, "category" => category.to_string())
            .increment((stats.malformed + stats.undecodable) as u64);

        info!(
            category,
            pages = stats.pages_fetched,
            accepted = stats.accepted,
            inserted = stats.inserted,
            duplicates = stats.duplicates,
            failed_batches = stats.failed_batches,
            "Finished category"
        );

        Ok(stats)
    }
}
