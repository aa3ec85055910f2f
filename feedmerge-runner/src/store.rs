//! In-memory aggregation of per-entity results between flushes.
//!
//! Fetch tasks complete out of order on worker threads and apply their
//! selected values here; the driver thread drains the store into scratch
//! storage between batches. One mutex guards the whole map. Contention is
//! low because applying a result is a handful of field writes next to a
//! network round trip.

use crate::scratch::{ScratchError, ScratchFile};
use feedmerge_core::domain::{Entity, EntityId, EntityResult, FeedKind, FeedValues};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

#[derive(Debug)]
struct Slot {
    row: EntityResult,
    projection_attempted: bool,
    classifier_attempted: bool,
}

impl Slot {
    fn is_complete(&self) -> bool {
        self.projection_attempted && self.classifier_attempted
    }
}

#[derive(Debug, Default)]
struct Inner {
    /// Rows in first-touch order.
    slots: Vec<Slot>,
    index: HashMap<EntityId, usize>,
    peak: usize,
}

/// Concurrency-safe accumulator keyed by entity id.
#[derive(Debug, Default)]
pub struct AggregationStore {
    inner: Mutex<Inner>,
}

impl AggregationStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panicking worker cannot leave a slot half-written: every mutation
        // below is a plain field store.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fold one feed's selected values into the entity's row, creating the row
    /// from roster metadata on first touch.
    pub fn apply(&self, entity: &Entity, values: &FeedValues) {
        let mut guard = self.lock();
        let inner = &mut *guard;
        let idx = match inner.index.get(&entity.id).copied() {
            Some(idx) => idx,
            None => {
                let idx = inner.slots.len();
                inner.slots.push(Slot {
                    row: EntityResult::for_entity(entity),
                    projection_attempted: false,
                    classifier_attempted: false,
                });
                inner.index.insert(entity.id, idx);
                inner.peak = inner.peak.max(inner.slots.len());
                idx
            }
        };
        let slot = &mut inner.slots[idx];
        slot.row.apply(values);
        match values.kind() {
            FeedKind::Projection => slot.projection_attempted = true,
            FeedKind::Classifier => slot.classifier_attempted = true,
        }
    }

    /// Number of buffered entities.
    pub fn size(&self) -> usize {
        self.lock().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Buffered entities for which both feeds have been attempted.
    pub fn complete_count(&self) -> usize {
        self.lock().slots.iter().filter(|s| s.is_complete()).count()
    }

    /// Largest number of entities ever buffered at once.
    pub fn peak_size(&self) -> usize {
        self.lock().peak
    }

    /// Copy of the buffered row for an entity, if any.
    pub fn get(&self, id: EntityId) -> Option<EntityResult> {
        let inner = self.lock();
        inner.index.get(&id).map(|&idx| inner.slots[idx].row.clone())
    }

    /// Take every buffered row, leaving the store empty. The swap happens
    /// under the lock, so no caller observes a partially drained store.
    pub fn drain(&self) -> Vec<EntityResult> {
        let (slots, incomplete) = {
            let mut inner = self.lock();
            inner.index.clear();
            let slots = std::mem::take(&mut inner.slots);
            let incomplete = slots.iter().filter(|s| !s.is_complete()).count();
            (slots, incomplete)
        };
        if incomplete > 0 {
            warn!(incomplete, "draining rows with an unattempted feed");
        }
        slots.into_iter().map(|s| s.row).collect()
    }

    /// Drain into scratch if at least `threshold` entities are buffered.
    ///
    /// Returns the number of rows flushed, or `None` if below threshold.
    pub fn flush_if_threshold(
        &self,
        threshold: usize,
        scratch: &ScratchFile,
    ) -> Result<Option<usize>, ScratchError> {
        if self.size() < threshold {
            return Ok(None);
        }
        let rows = self.drain();
        let written = scratch.append(&rows)?;
        debug!(rows = written, threshold, "flushed store to scratch");
        Ok(Some(written))
    }

    /// Drain whatever remains into scratch. Returns the number of rows written.
    pub fn drain_remaining(&self, scratch: &ScratchFile) -> Result<usize, ScratchError> {
        let rows = self.drain();
        if rows.is_empty() {
            return Ok(0);
        }
        scratch.append(&rows)
    }
}
