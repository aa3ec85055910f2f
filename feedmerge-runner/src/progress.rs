//! Progress reporting for pipeline runs.

use crate::batch::BatchReport;
use crate::pipeline::PipelineSummary;
use std::path::Path;

/// Callbacks fired from the driver thread as a run advances.
pub trait PipelineProgress: Send {
    /// Called before a batch's fetches start.
    fn on_batch_start(&self, index: usize, total: usize, entities: usize);

    /// Called once every task of a batch has settled.
    fn on_batch_complete(&self, index: usize, total: usize, report: &BatchReport);

    /// Called after rows are spilled to scratch storage.
    fn on_flush(&self, rows: usize, scratch: &Path);

    /// Called after the final artifact is written.
    fn on_finish(&self, summary: &PipelineSummary);
}

/// Simple progress reporter that prints to stdout.
pub struct StdoutProgress;

impl PipelineProgress for StdoutProgress {
    fn on_batch_start(&self, index: usize, total: usize, entities: usize) {
        println!("[batch {}/{}] Fetching {entities} entities...", index + 1, total);
    }

    fn on_batch_complete(&self, index: usize, total: usize, report: &BatchReport) {
        println!(
            "[batch {}/{}] {} fetches, {} with data, {} failed ({:.1}s)",
            index + 1,
            total,
            report.tasks,
            report.non_empty,
            report.failed_fetches,
            report.elapsed.as_secs_f64()
        );
    }

    fn on_flush(&self, rows: usize, scratch: &Path) {
        println!("  Spilled {rows} rows to {}", scratch.display());
    }

    fn on_finish(&self, summary: &PipelineSummary) {
        println!(
            "\nDone: {} rows from {} entities in {} batches ({} failed fetches, {:.1}s)",
            summary.rows_written,
            summary.entities,
            summary.batches,
            summary.failed_fetches,
            summary.elapsed.as_secs_f64()
        );
        println!("Data saved to: {}", summary.artifact.display());
    }
}

/// Reporter that discards every event.
pub struct SilentProgress;

impl PipelineProgress for SilentProgress {
    fn on_batch_start(&self, _index: usize, _total: usize, _entities: usize) {}
    fn on_batch_complete(&self, _index: usize, _total: usize, _report: &BatchReport) {}
    fn on_flush(&self, _rows: usize, _scratch: &Path) {}
    fn on_finish(&self, _summary: &PipelineSummary) {}
}
