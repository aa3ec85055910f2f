//! Pipeline driver — batches, flushes, consolidation, export.
//!
//! Batches run strictly in sequence: batch N settles and, if the store has
//! reached the flush threshold, spills to scratch before batch N+1 starts.
//! That ordering is what bounds memory. After the last batch the residue is
//! drained, the scratch file is read back and de-duplicated by entity id, and
//! the result is handed to the output writer. Scratch is deleted only after
//! the writer reports success.

use crate::batch::BatchFetcher;
use crate::config::{ConfigError, PipelineConfig};
use crate::export::{ExportError, OutputWriter};
use crate::progress::PipelineProgress;
use crate::scratch::{ScratchError, ScratchFile};
use crate::store::AggregationStore;
use feedmerge_core::domain::{EntityId, EntityResult};
use feedmerge_core::feed::FeedClient;
use feedmerge_core::Roster;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{info, warn};

/// Failures that stop a run. Fetch failures never surface here.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error(transparent)]
    Scratch(#[from] ScratchError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

/// What a completed run did.
#[derive(Debug, Clone)]
pub struct PipelineSummary {
    pub entities: usize,
    pub batches: usize,
    pub flushes: usize,
    /// Rows in the final artifact (one per unique entity id).
    pub rows_written: usize,
    pub failed_fetches: usize,
    /// Most entities buffered in memory at once.
    pub peak_buffered: usize,
    pub artifact: PathBuf,
    pub elapsed: Duration,
}

/// Run the whole fetch-and-merge pipeline over `roster`.
pub fn run_pipeline(
    roster: &Roster,
    client: &dyn FeedClient,
    config: &PipelineConfig,
    scratch: &ScratchFile,
    output: &dyn OutputWriter,
    progress: &dyn PipelineProgress,
) -> Result<PipelineSummary, PipelineError> {
    config.validate()?;
    let started = Instant::now();

    if scratch.reset()? {
        warn!(path = %scratch.path().display(), "removed stale scratch file from an earlier run");
    }

    let fetcher = BatchFetcher::new(client, config.workers, config.windows(), config.pacing())?;
    let store = AggregationStore::new();
    let threshold = config.flush_threshold();
    let total = roster.batch_count(config.batch_size);

    info!(
        entities = roster.len(),
        batches = total,
        workers = fetcher.workers(),
        client = client.name(),
        "starting pipeline"
    );

    let mut flushes = 0;
    let mut failed_fetches = 0;

    for (index, batch) in roster.batches(config.batch_size).enumerate() {
        progress.on_batch_start(index, total, batch.len());
        let report = fetcher.process_batch(batch, &store);
        failed_fetches += report.failed_fetches;
        progress.on_batch_complete(index, total, &report);

        if let Some(rows) = store.flush_if_threshold(threshold, scratch)? {
            flushes += 1;
            progress.on_flush(rows, scratch.path());
        }
    }

    let residual = store.drain_remaining(scratch)?;
    if residual > 0 {
        flushes += 1;
        progress.on_flush(residual, scratch.path());
    }

    let rows = consolidate(scratch)?;
    let artifact = output.write(&rows)?;
    scratch.remove()?;
    info!(path = %artifact.display(), rows = rows.len(), "artifact written; scratch removed");

    let summary = PipelineSummary {
        entities: roster.len(),
        batches: total,
        flushes,
        rows_written: rows.len(),
        failed_fetches,
        peak_buffered: store.peak_size(),
        artifact,
        elapsed: started.elapsed(),
    };
    progress.on_finish(&summary);
    Ok(summary)
}

/// Read every flushed row back, coerce numeric columns, and merge rows that
/// share an entity id. Output order is first appearance in scratch.
pub fn consolidate(scratch: &ScratchFile) -> Result<Vec<EntityResult>, ScratchError> {
    let mut rows: Vec<EntityResult> = Vec::new();
    let mut seen: HashMap<EntityId, usize> = HashMap::new();
    let mut dropped = 0usize;

    for raw in scratch.read_all()? {
        let Some(row) = raw.coerce() else {
            dropped += 1;
            continue;
        };
        match seen.get(&row.id).copied() {
            Some(idx) => rows[idx].merge(row),
            None => {
                seen.insert(row.id, rows.len());
                rows.push(row);
            }
        }
    }

    if dropped > 0 {
        warn!(dropped, "scratch rows without a usable id were dropped");
    }
    Ok(rows)
}
