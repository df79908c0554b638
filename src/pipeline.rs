use crate::config::ImportConfig;
use crate::error::Result;
use crate::extract::{LoanExtractor, RowFilter};
use crate::report::RunReporter;
use crate::storage::LoanStore;
use crate::types::LoanRecord;
use crate::writer::{BatchWriter, WriteSummary};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;
use std::sync::Arc;
use tracing::{info, instrument};

/// Result of a complete import run
#[derive(Debug, Serialize)]
pub struct ImportResult {
    pub matched_records: usize,
    pub summary: WriteSummary,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Read the configured input file and return every row passing the filter.
pub fn extract_loans(config: &ImportConfig) -> Result<Vec<LoanRecord>> {
    let filter = RowFilter::new(config.state.clone(), config.naics_code.clone());
    let extractor = LoanExtractor::from_path(&config.input_path, filter)?;
    Ok(extractor.records().collect())
}

/// Extract, report, then upsert everything into `store`. Only a failure to
/// open the input escapes as an error; write failures end up in the summary.
#[instrument(skip_all, fields(input = %config.input_path.display()))]
pub async fn run_import<W: Write>(
    config: &ImportConfig,
    store: Arc<dyn LoanStore>,
    reporter: &mut RunReporter<W>,
) -> Result<ImportResult> {
    let started_at = Utc::now();

    let records = extract_loans(config)?;
    reporter.found(records.len(), &config.filter_label());

    let writer = BatchWriter::new(
        store,
        config.supabase.table.clone(),
        config.supabase.conflict_column.clone(),
        config.supabase.batch_size,
    );
    let summary = writer.write_all(&records, reporter).await;
    reporter.finished(&summary);

    let finished_at = Utc::now();
    info!(
        elapsed_ms = (finished_at - started_at).num_milliseconds(),
        "Import run complete"
    );

    Ok(ImportResult {
        matched_records: records.len(),
        summary,
        started_at,
        finished_at,
    })
}
