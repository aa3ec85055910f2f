//! Shared fixtures for runner integration tests.

#![allow(dead_code)]

use feedmerge_core::domain::{
    ClassifierRecord, Entity, EntityId, FeedKind, FeedRecords, ModelKind, ProjectionRecord,
};
use feedmerge_core::feed::{FeedClient, FetchError};
use feedmerge_runner::{BatchReport, PipelineConfig, PipelineProgress, PipelineSummary};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Timestamp `hours_ago` hours before the local wall clock, in feed format.
pub fn stamp_hours_ago(hours_ago: i64) -> Option<String> {
    let ts = chrono::Local::now().naive_local() - chrono::Duration::hours(hours_ago);
    Some(ts.format("%Y-%m-%d %H:%M:%S%.6f").to_string())
}

pub fn projection(hours_ago: i64, score: f64) -> ProjectionRecord {
    ProjectionRecord {
        timestamp: stamp_hours_ago(hours_ago),
        score: Some(score),
        low: None,
        high: None,
    }
}

pub fn classifier(kind: ModelKind, hours_ago: i64, value: f64) -> ClassifierRecord {
    ClassifierRecord {
        timestamp: stamp_hours_ago(hours_ago),
        model_kind: kind,
        normalized_result: Some(value),
    }
}

pub fn entity(id: u64) -> Entity {
    Entity::new(id, format!("Player {id}"), "WR", "DAL")
}

/// Fast config for tests: no pacing, small pool.
pub fn test_config(batch_size: usize) -> PipelineConfig {
    PipelineConfig {
        batch_size,
        workers: 3,
        pacing_ms: 0,
        ..Default::default()
    }
}

/// In-memory feed client. Unconfigured pairs answer with no records.
#[derive(Default)]
pub struct FixtureClient {
    responses: HashMap<(EntityId, FeedKind), Result<FeedRecords, String>>,
    pub calls: AtomicUsize,
}

impl FixtureClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_projections(mut self, id: u64, records: Vec<ProjectionRecord>) -> Self {
        self.responses.insert(
            (EntityId(id), FeedKind::Projection),
            Ok(FeedRecords::Projection(records)),
        );
        self
    }

    pub fn with_classifiers(mut self, id: u64, records: Vec<ClassifierRecord>) -> Self {
        self.responses.insert(
            (EntityId(id), FeedKind::Classifier),
            Ok(FeedRecords::Classifier(records)),
        );
        self
    }

    pub fn with_network_error(mut self, id: u64, kind: FeedKind) -> Self {
        self.responses
            .insert((EntityId(id), kind), Err("connection refused".into()));
        self
    }
}

impl FeedClient for FixtureClient {
    fn name(&self) -> &str {
        "fixture"
    }

    fn fetch(&self, entity_id: EntityId, kind: FeedKind) -> Result<FeedRecords, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.responses.get(&(entity_id, kind)) {
            Some(Ok(records)) => Ok(records.clone()),
            Some(Err(message)) => Err(FetchError::Network {
                entity_id,
                feed_kind: kind,
                message: message.clone(),
            }),
            None => Ok(FeedRecords::empty(kind)),
        }
    }
}

/// Records every progress event as a short string.
#[derive(Default)]
pub struct RecordingProgress {
    pub events: Mutex<Vec<String>>,
}

impl RecordingProgress {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl PipelineProgress for RecordingProgress {
    fn on_batch_start(&self, index: usize, total: usize, entities: usize) {
        self.events
            .lock()
            .unwrap()
            .push(format!("start {index}/{total} ({entities})"));
    }

    fn on_batch_complete(&self, index: usize, _total: usize, report: &BatchReport) {
        self.events
            .lock()
            .unwrap()
            .push(format!("done {index} tasks={}", report.tasks));
    }

    fn on_flush(&self, rows: usize, _scratch: &Path) {
        self.events.lock().unwrap().push(format!("flush {rows}"));
    }

    fn on_finish(&self, summary: &PipelineSummary) {
        self.events
            .lock()
            .unwrap()
            .push(format!("finish {}", summary.rows_written));
    }
}
