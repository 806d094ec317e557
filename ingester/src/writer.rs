use crate::model::TenderRecord;
use crate::store::{InsertOutcome, TenderStore};
use metrics::counter;
use std::sync::Arc;
use tenders_core::telemetry::{BATCH_FAILURES, TENDERS_INSERTED};
use tenders_core::Result;
use tracing::{debug, error};

/// Sends one page worth of accepted records to the store as a single insert.
pub struct BatchWriter {
    store: Arc<dyn TenderStore>,
}

impl BatchWriter {
    pub fn new(store: Arc<dyn TenderStore>) -> Self {
        Self { store }
    }

    /// `Ok(false)` when the store refused the batch. Refused batches are not
    /// retried, and their identity keys stay reserved for the rest of the run.
    pub async fn write(&self, records: &[TenderRecord]) -> Result<bool> {
        if records.is_empty() {
            return Ok(true);
        }

        match self.store.insert_tenders(records).await? {
            InsertOutcome::Inserted => {
                counter!(TENDERS_INSERTED).increment(records.len() as u64);
                debug!(count = records.len(), "Inserted tender batch");
                Ok(true)
            }
            InsertOutcome::Rejected { status, body } => {
                counter!(BATCH_FAILURES).increment(1);
                error!(
                    status,
                    count = records.len(),
                    body = %body,
                    "❌ Batch insert error"
                );
                Ok(false)
            }
        }
    }
}
