//! Criterion benchmarks for record selection.
//!
//! Benchmarks:
//! 1. Projection selection over responses of increasing length
//! 2. Classifier selection over interleaved bust/breakout responses

use chrono::{Duration, NaiveDate, NaiveDateTime};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use feedmerge_core::domain::{ClassifierRecord, ModelKind, ProjectionRecord};
use feedmerge_core::select::{select_classifiers_at, select_projection_at};

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 9, 10)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

fn make_projections(n: usize) -> Vec<ProjectionRecord> {
    (0..n)
        .map(|i| ProjectionRecord {
            timestamp: Some(
                (now() - Duration::minutes(i as i64 * 37))
                    .format("%Y-%m-%d %H:%M:%S%.3f")
                    .to_string(),
            ),
            score: Some(10.0 + (i as f64 * 0.1).sin()),
            low: Some(5.0),
            high: Some(15.0),
        })
        .collect()
}

fn make_classifiers(n: usize) -> Vec<ClassifierRecord> {
    (0..n)
        .map(|i| ClassifierRecord {
            timestamp: Some(
                (now() - Duration::minutes(i as i64 * 11))
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string(),
            ),
            model_kind: if i % 2 == 0 {
                ModelKind::Bust
            } else {
                ModelKind::Breakout
            },
            normalized_result: Some((i % 100) as f64 / 100.0),
        })
        .collect()
}

fn bench_selection(c: &mut Criterion) {
    let mut group = c.benchmark_group("select");
    for n in [16usize, 128, 1024] {
        let projections = make_projections(n);
        let classifiers = make_classifiers(n);
        group.bench_with_input(BenchmarkId::new("projection", n), &projections, |b, recs| {
            b.iter(|| select_projection_at(black_box(recs), 3, now()))
        });
        group.bench_with_input(BenchmarkId::new("classifiers", n), &classifiers, |b, recs| {
            b.iter(|| select_classifiers_at(black_box(recs), 1, now()))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_selection);
criterion_main!(benches);
