//! End-to-end pipeline runs against an in-memory feed client.

mod common;

use common::*;
use feedmerge_core::domain::{EntityId, EntityResult, FeedKind, ModelKind};
use feedmerge_core::Roster;
use feedmerge_runner::{
    run_pipeline, ConfigError, CsvOutput, ExportError, OutputWriter, PipelineError, ScratchFile,
    SilentProgress,
};
use std::path::PathBuf;

fn read_artifact(path: &std::path::Path) -> Vec<EntityResult> {
    let mut rdr = csv::Reader::from_path(path).unwrap();
    rdr.deserialize().map(|r| r.unwrap()).collect()
}

#[test]
fn two_entity_single_batch_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let client = FixtureClient::new()
        .with_projections(1, vec![projection(0, 12.5)])
        .with_classifiers(1, vec![classifier(ModelKind::Bust, 0, 0.3)]);
    let roster = Roster::new(vec![entity(1), entity(2)]);
    let scratch = ScratchFile::new(dir.path().join("scratch.csv"));
    let output = CsvOutput::new(dir.path().join("out.csv"));

    let summary = run_pipeline(
        &roster,
        &client,
        &test_config(100),
        &scratch,
        &output,
        &SilentProgress,
    )
    .unwrap();

    assert_eq!(summary.batches, 1);
    assert_eq!(summary.rows_written, 2);
    assert_eq!(summary.failed_fetches, 0);
    assert!(!scratch.exists(), "scratch must be deleted after export");

    let rows = read_artifact(&summary.artifact);
    let a = rows.iter().find(|r| r.id == EntityId(1)).unwrap();
    assert_eq!(a.score_projection, Some(12.5));
    assert_eq!(a.low_score, None);
    assert_eq!(a.high_score, None);
    assert_eq!(a.bust, Some(0.3));
    assert_eq!(a.breakout, None);
    assert_eq!(a.name, "Player 1");

    let b = rows.iter().find(|r| r.id == EntityId(2)).unwrap();
    assert!(b.has_no_feed_data());
}

#[test]
fn freshest_projection_wins_and_stale_records_drop() {
    let dir = tempfile::tempdir().unwrap();
    let client = FixtureClient::new()
        .with_projections(1, vec![projection(30, 10.0), projection(2, 20.0)])
        .with_projections(2, vec![projection(24 * 10, 99.0)]);
    let roster = Roster::new(vec![entity(1), entity(2)]);

    let summary = run_pipeline(
        &roster,
        &client,
        &test_config(10),
        &ScratchFile::new(dir.path().join("scratch.csv")),
        &CsvOutput::new(dir.path().join("out.csv")),
        &SilentProgress,
    )
    .unwrap();

    let rows = read_artifact(&summary.artifact);
    assert_eq!(
        rows.iter().find(|r| r.id == EntityId(1)).unwrap().score_projection,
        Some(20.0)
    );
    assert_eq!(
        rows.iter().find(|r| r.id == EntityId(2)).unwrap().score_projection,
        None
    );
}

#[test]
fn network_failures_do_not_abort_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let client = FixtureClient::new()
        .with_projections(1, vec![projection(1, 8.0)])
        .with_network_error(1, FeedKind::Classifier)
        .with_network_error(2, FeedKind::Projection)
        .with_network_error(2, FeedKind::Classifier)
        .with_classifiers(3, vec![classifier(ModelKind::Breakout, 1, 0.9)]);
    let roster = Roster::new(vec![entity(1), entity(2), entity(3)]);

    let summary = run_pipeline(
        &roster,
        &client,
        &test_config(2),
        &ScratchFile::new(dir.path().join("scratch.csv")),
        &CsvOutput::new(dir.path().join("out.csv")),
        &SilentProgress,
    )
    .unwrap();

    assert_eq!(summary.failed_fetches, 3);
    assert_eq!(summary.rows_written, 3);
    let rows = read_artifact(&summary.artifact);
    let one = rows.iter().find(|r| r.id == EntityId(1)).unwrap();
    assert_eq!(one.score_projection, Some(8.0));
    assert_eq!(one.bust, None);
    assert!(rows.iter().find(|r| r.id == EntityId(2)).unwrap().has_no_feed_data());
    assert_eq!(rows.iter().find(|r| r.id == EntityId(3)).unwrap().breakout, Some(0.9));
}

#[test]
fn multi_batch_run_flushes_and_bounds_memory() {
    let dir = tempfile::tempdir().unwrap();
    let client = FixtureClient::new();
    let roster = Roster::new((1..=23).map(entity).collect());
    let progress = RecordingProgress::default();

    let summary = run_pipeline(
        &roster,
        &client,
        &test_config(5),
        &ScratchFile::new(dir.path().join("scratch.csv")),
        &CsvOutput::new(dir.path().join("out.csv")),
        &progress,
    )
    .unwrap();

    assert_eq!(summary.batches, 5);
    assert_eq!(summary.flushes, 5);
    assert!(summary.peak_buffered <= 5);
    assert_eq!(summary.rows_written, 23);
    assert_eq!(client.calls.load(std::sync::atomic::Ordering::SeqCst), 46);

    let events = progress.events();
    assert_eq!(events.first().unwrap(), "start 0/5 (5)");
    assert_eq!(events.iter().filter(|e| e.starts_with("flush")).count(), 5);
    assert!(events.contains(&"flush 3".to_string()));
    assert_eq!(events.last().unwrap(), "finish 23");

    // Rows keep roster order because every batch is flushed whole.
    let ids: Vec<u64> = read_artifact(&summary.artifact).iter().map(|r| r.id.0).collect();
    let mut batches: Vec<Vec<u64>> = ids.chunks(5).map(|c| c.to_vec()).collect();
    for chunk in &mut batches {
        chunk.sort_unstable();
    }
    assert_eq!(batches.concat(), (1..=23).collect::<Vec<_>>());
}

#[test]
fn duplicate_roster_ids_collapse_to_one_row() {
    let dir = tempfile::tempdir().unwrap();
    let client = FixtureClient::new()
        .with_projections(4, vec![projection(1, 4.0)])
        .with_classifiers(4, vec![classifier(ModelKind::Bust, 1, 0.2)]);
    let roster = Roster::new(vec![
        entity(4),
        entity(5),
        entity(6),
        entity(4),
        entity(7),
        entity(4),
    ]);

    let summary = run_pipeline(
        &roster,
        &client,
        &test_config(2),
        &ScratchFile::new(dir.path().join("scratch.csv")),
        &CsvOutput::new(dir.path().join("out.csv")),
        &SilentProgress,
    )
    .unwrap();

    assert_eq!(summary.rows_written, roster.unique_ids());
    let rows = read_artifact(&summary.artifact);
    let fours: Vec<_> = rows.iter().filter(|r| r.id == EntityId(4)).collect();
    assert_eq!(fours.len(), 1);
    assert_eq!(fours[0].score_projection, Some(4.0));
    assert_eq!(fours[0].bust, Some(0.2));
}

#[test]
fn stale_scratch_from_earlier_run_is_discarded() {
    let dir = tempfile::tempdir().unwrap();
    let scratch = ScratchFile::new(dir.path().join("scratch.csv"));
    std::fs::write(
        scratch.path(),
        "name,id,position,team,score_projection,low_score,high_score,bust,breakout\nGhost,999,K,NE,1,,,,\n",
    )
    .unwrap();

    let summary = run_pipeline(
        &Roster::new(vec![entity(1)]),
        &FixtureClient::new(),
        &test_config(10),
        &scratch,
        &CsvOutput::new(dir.path().join("out.csv")),
        &SilentProgress,
    )
    .unwrap();

    let rows = read_artifact(&summary.artifact);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, EntityId(1));
}

#[test]
fn empty_roster_writes_header_only_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let summary = run_pipeline(
        &Roster::default(),
        &FixtureClient::new(),
        &test_config(10),
        &ScratchFile::new(dir.path().join("scratch.csv")),
        &CsvOutput::new(dir.path().join("out.csv")),
        &SilentProgress,
    )
    .unwrap();
    assert_eq!(summary.batches, 0);
    assert_eq!(summary.rows_written, 0);
    assert!(summary.artifact.exists());
}

struct FailingOutput;

impl OutputWriter for FailingOutput {
    fn write(&self, _rows: &[EntityResult]) -> Result<PathBuf, ExportError> {
        Err(ExportError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "read-only volume",
        )))
    }
}

#[test]
fn export_failure_is_fatal_and_keeps_scratch() {
    let dir = tempfile::tempdir().unwrap();
    let scratch = ScratchFile::new(dir.path().join("scratch.csv"));
    let err = run_pipeline(
        &Roster::new(vec![entity(1), entity(2)]),
        &FixtureClient::new(),
        &test_config(10),
        &scratch,
        &FailingOutput,
        &SilentProgress,
    )
    .unwrap_err();

    assert!(matches!(err, PipelineError::Export(_)));
    assert!(scratch.exists(), "scratch must survive a failed export");
    assert_eq!(scratch.read_all().unwrap().len(), 2);
}

#[test]
fn invalid_config_fails_before_fetching() {
    let dir = tempfile::tempdir().unwrap();
    let client = FixtureClient::new();
    let mut config = test_config(10);
    config.workers = 0;

    let err = run_pipeline(
        &Roster::new(vec![entity(1)]),
        &client,
        &config,
        &ScratchFile::new(dir.path().join("scratch.csv")),
        &CsvOutput::new(dir.path().join("out.csv")),
        &SilentProgress,
    )
    .unwrap_err();

    assert!(matches!(err, PipelineError::Config(ConfigError::Invalid(_))));
    assert_eq!(client.calls.load(std::sync::atomic::Ordering::SeqCst), 0);
}
