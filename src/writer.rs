use crate::report::RunReporter;
use crate::storage::LoanStore;
use crate::types::LoanRecord;
use metrics::counter;
use serde::Serialize;
use std::io::Write;
use std::sync::Arc;
use tracing::{debug, instrument};

/// A record that could not be written even on its own.
#[derive(Debug, Clone, Serialize)]
pub struct RecordFailure {
    pub loan_number: Option<String>,
    pub borrower_name: Option<String>,
    pub error: String,
    pub transient: bool,
}

/// Outcome of writing a full record set.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WriteSummary {
    pub batches_attempted: usize,
    /// Batches accepted in a single request.
    pub batches_written: usize,
    /// Batches that failed and were retried one record at a time.
    pub batches_split: usize,
    pub records_written: usize,
    pub failures: Vec<RecordFailure>,
}

impl WriteSummary {
    pub fn records_failed(&self) -> usize {
        self.failures.len()
    }
}

/// Upserts records in fixed-size batches. A failed batch is retried row by
/// row so one bad record cannot block the rest of its batch.
pub struct BatchWriter {
    store: Arc<dyn LoanStore>,
    table: String,
    conflict_column: String,
    batch_size: usize,
}

impl BatchWriter {
    pub fn new(
        store: Arc<dyn LoanStore>,
        table: impl Into<String>,
        conflict_column: impl Into<String>,
        batch_size: usize,
    ) -> Self {
        Self {
            store,
            table: table.into(),
            conflict_column: conflict_column.into(),
            batch_size: batch_size.max(1),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Write every record, in order, one request at a time. Never fails; the
    /// summary says what made it.
    #[instrument(skip_all, fields(table = %self.table, records = records.len()))]
    pub async fn write_all<W: Write>(
        &self,
        records: &[LoanRecord],
        reporter: &mut RunReporter<W>,
    ) -> WriteSummary {
        let mut summary = WriteSummary::default();

        for (index, batch) in records.chunks(self.batch_size).enumerate() {
            let batch_no = index + 1;
            summary.batches_attempted += 1;
            counter!("ppp_import_batches_total").increment(1);

            match self
                .store
                .upsert(&self.table, batch, &self.conflict_column)
                .await
            {
                Ok(()) => {
                    summary.batches_written += 1;
                    summary.records_written += batch.len();
                    counter!("ppp_import_records_written_total").increment(batch.len() as u64);
                    reporter.batch_written(batch_no, batch.len());
                }
                Err(e) => {
                    summary.batches_split += 1;
                    counter!("ppp_import_batch_failures_total", "kind" => e.kind()).increment(1);
                    reporter.batch_failed(batch_no, &e);
                    self.write_one_by_one(batch, &mut summary, reporter).await;
                }
            }
        }

        summary
    }

    async fn write_one_by_one<W: Write>(
        &self,
        batch: &[LoanRecord],
        summary: &mut WriteSummary,
        reporter: &mut RunReporter<W>,
    ) {
        for record in batch {
            let single = std::slice::from_ref(record);
            match self
                .store
                .upsert(&self.table, single, &self.conflict_column)
                .await
            {
                Ok(()) => {
                    summary.records_written += 1;
                    counter!("ppp_import_records_written_total").increment(1);
                    debug!("Wrote loan {} on its own", record.loan_number_or_blank());
                }
                Err(e) => {
                    counter!("ppp_import_record_failures_total", "kind" => e.kind()).increment(1);
                    reporter.record_failed(record.display_name(), record.loan_number_or_blank(), &e);
                    summary.failures.push(RecordFailure {
                        loan_number: record.loan_number.clone(),
                        borrower_name: record.borrower_name.clone(),
                        error: e.to_string(),
                        transient: e.is_transient(),
                    });
                }
            }
        }
    }
}
