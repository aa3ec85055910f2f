//! Batch fetcher — bounded-concurrency fan-out of feed fetches.
//!
//! Every entity in a batch gets one projection and one classifier task. A
//! dedicated Rayon pool of `workers` threads runs them, so at most `workers`
//! fetches are in flight. Each task selects and applies its own result to the
//! store as soon as it settles; `process_batch` returns only once every task
//! has settled.

use crate::store::AggregationStore;
use chrono::NaiveDateTime;
use feedmerge_core::domain::{Entity, FeedKind, FeedValues};
use feedmerge_core::feed::FeedClient;
use feedmerge_core::select::{self, FreshnessWindows};
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Outcome counters for one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub entities: usize,
    pub tasks: usize,
    /// Tasks whose fetch failed (network or malformed response).
    pub failed_fetches: usize,
    /// Tasks that returned at least one record.
    pub non_empty: usize,
    pub elapsed: Duration,
}

/// Fans fetches for a batch out over a fixed-size worker pool.
pub struct BatchFetcher<'c> {
    client: &'c dyn FeedClient,
    pool: rayon::ThreadPool,
    windows: FreshnessWindows,
    pacing: Duration,
    reference_time: Option<NaiveDateTime>,
}

impl<'c> BatchFetcher<'c> {
    pub fn new(
        client: &'c dyn FeedClient,
        workers: usize,
        windows: FreshnessWindows,
        pacing: Duration,
    ) -> Result<Self, rayon::ThreadPoolBuildError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .thread_name(|i| format!("feedmerge-fetch-{i}"))
            .build()?;
        Ok(Self {
            client,
            pool,
            windows,
            pacing,
            reference_time: None,
        })
    }

    /// Judge record age against a fixed instant instead of the wall clock.
    pub fn with_reference_time(mut self, now: NaiveDateTime) -> Self {
        self.reference_time = Some(now);
        self
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Fetch, select and apply both feeds for every entity in `entities`.
    pub fn process_batch(&self, entities: &[Entity], store: &AggregationStore) -> BatchReport {
        let started = Instant::now();
        let now = self
            .reference_time
            .unwrap_or_else(|| chrono::Local::now().naive_local());

        let tasks: Vec<(&Entity, FeedKind)> = entities
            .iter()
            .flat_map(|e| FeedKind::ALL.map(|kind| (e, kind)))
            .collect();
        let failed = AtomicUsize::new(0);
        let non_empty = AtomicUsize::new(0);

        self.pool.install(|| {
            tasks
                .par_iter()
                .with_max_len(1)
                .for_each(|&(entity, kind)| {
                    let values = self.run_task(entity, kind, now, &failed, &non_empty);
                    store.apply(entity, &values);
                });
        });

        let report = BatchReport {
            entities: entities.len(),
            tasks: tasks.len(),
            failed_fetches: failed.into_inner(),
            non_empty: non_empty.into_inner(),
            elapsed: started.elapsed(),
        };
        debug!(?report, "batch settled");
        report
    }

    /// One paced fetch plus selection. Failures yield absent values.
    fn run_task(
        &self,
        entity: &Entity,
        kind: FeedKind,
        now: NaiveDateTime,
        failed: &AtomicUsize,
        non_empty: &AtomicUsize,
    ) -> FeedValues {
        if !self.pacing.is_zero() {
            std::thread::sleep(self.pacing);
        }

        match self.client.fetch(entity.id, kind) {
            Ok(records) if records.kind() != kind => {
                warn!(
                    entity_id = %entity.id,
                    feed = %kind,
                    got = %records.kind(),
                    "client returned records for the wrong feed; ignoring"
                );
                failed.fetch_add(1, Ordering::Relaxed);
                FeedValues::absent(kind)
            }
            Ok(records) => {
                if !records.is_empty() {
                    non_empty.fetch_add(1, Ordering::Relaxed);
                }
                select::select_at(&records, &self.windows, now)
            }
            Err(e) => {
                warn!(
                    entity_id = %entity.id,
                    feed = %kind,
                    error = %e,
                    "fetch failed; no data for this feed"
                );
                failed.fetch_add(1, Ordering::Relaxed);
                FeedValues::absent(kind)
            }
        }
    }
}
