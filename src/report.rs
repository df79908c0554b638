use crate::error::StoreError;
use crate::writer::WriteSummary;
use std::io::{self, Write};
use tracing::{error, info, warn};

/// Human-readable progress lines for an import run. Every line is also emitted
/// as a tracing event. Failing to write to the console never stops the run.
pub struct RunReporter<W: Write> {
    out: W,
}

impl RunReporter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> RunReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: &str) {
        let _ = writeln!(self.out, "{text}");
    }

    pub fn found(&mut self, count: usize, label: &str) {
        info!(count, "Extracted matching loans");
        self.line(&format!("Found {count} {label} PPP loans"));
    }

    pub fn batch_written(&mut self, batch: usize, size: usize) {
        info!(batch, size, "Batch upserted");
        self.line(&format!("Inserted batch {batch}: {size} records"));
    }

    pub fn batch_failed(&mut self, batch: usize, err: &StoreError) {
        warn!(batch, kind = err.kind(), "Batch upsert failed, retrying row by row: {}", err);
        self.line(&format!("Error inserting batch {batch}: {err}"));
    }

    pub fn record_failed(&mut self, name: &str, loan_number: &str, err: &StoreError) {
        error!(loan_number, kind = err.kind(), "Record upsert failed for {}: {}", name, err);
        self.line(&format!("Error inserting {name}: {err}"));
    }

    pub fn finished(&mut self, summary: &WriteSummary) {
        info!(
            written = summary.records_written,
            failed = summary.records_failed(),
            batches = summary.batches_attempted,
            "Import finished"
        );
        self.line(&format!(
            "Wrote {} records in {} batches ({} batches retried row by row, {} records failed)",
            summary.records_written,
            summary.batches_attempted,
            summary.batches_split,
            summary.records_failed(),
        ));
        self.line("Done!");
    }
}
