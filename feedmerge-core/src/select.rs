//! Recency-based record selection.
//!
//! For each feed the freshest record inside a whole-day age window wins.
//! Classifier responses interleave bust and breakout models; each model is
//! tracked independently, so the bust value never depends on breakout records
//! and vice versa.
//!
//! Records whose timestamp is missing or unparsable are skipped and logged.
//! Equal timestamps keep whichever record was seen first; callers must not
//! rely on that order.

use crate::domain::{
    ClassifierRecord, ClassifierValues, FeedKind, FeedRecords, FeedValues, ModelKind,
    ProjectionRecord, ProjectionValues,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Accepted timestamp layouts, tried in order.
pub const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"];

pub const DEFAULT_PROJECTION_MAX_AGE_DAYS: u32 = 3;
pub const DEFAULT_CLASSIFIER_MAX_AGE_DAYS: u32 = 1;

/// Maximum record age, in whole days, per feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreshnessWindows {
    pub projection_days: u32,
    pub classifier_days: u32,
}

impl Default for FreshnessWindows {
    fn default() -> Self {
        Self {
            projection_days: DEFAULT_PROJECTION_MAX_AGE_DAYS,
            classifier_days: DEFAULT_CLASSIFIER_MAX_AGE_DAYS,
        }
    }
}

impl FreshnessWindows {
    pub fn for_kind(&self, kind: FeedKind) -> u32 {
        match kind {
            FeedKind::Projection => self.projection_days,
            FeedKind::Classifier => self.classifier_days,
        }
    }
}

/// Parse a feed timestamp in either accepted layout.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

/// Whole-day age check. A record exactly `max_age_days` and some hours old
/// still qualifies; one more full day does not.
fn within_window(ts: NaiveDateTime, now: NaiveDateTime, max_age_days: u32) -> bool {
    (now - ts).num_days() <= i64::from(max_age_days)
}

/// Timestamp of a record if it is present, parses, and is inside the window.
fn qualifying_timestamp(
    raw: Option<&str>,
    now: NaiveDateTime,
    max_age_days: u32,
) -> Option<NaiveDateTime> {
    let raw = raw?;
    let Some(ts) = parse_timestamp(raw) else {
        warn!(timestamp = raw, "failed to parse execution timestamp; skipping record");
        return None;
    };
    within_window(ts, now, max_age_days).then_some(ts)
}

fn now_local() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

/// The freshest projection record inside the window, if any.
pub fn freshest_projection_at(
    records: &[ProjectionRecord],
    max_age_days: u32,
    now: NaiveDateTime,
) -> Option<&ProjectionRecord> {
    let mut best: Option<(NaiveDateTime, &ProjectionRecord)> = None;
    for rec in records {
        let Some(ts) = qualifying_timestamp(rec.timestamp.as_deref(), now, max_age_days) else {
            continue;
        };
        if best.map_or(true, |(best_ts, _)| ts > best_ts) {
            best = Some((ts, rec));
        }
    }
    best.map(|(_, rec)| rec)
}

/// Score, low and high of the freshest qualifying projection record.
pub fn select_projection_at(
    records: &[ProjectionRecord],
    max_age_days: u32,
    now: NaiveDateTime,
) -> ProjectionValues {
    freshest_projection_at(records, max_age_days, now)
        .map(|rec| ProjectionValues {
            score: rec.score,
            low: rec.low,
            high: rec.high,
        })
        .unwrap_or_default()
}

/// [`select_projection_at`] against the local wall clock.
pub fn select_projection(records: &[ProjectionRecord], max_age_days: u32) -> ProjectionValues {
    select_projection_at(records, max_age_days, now_local())
}

/// Bust and breakout results from the freshest qualifying record of each model.
pub fn select_classifiers_at(
    records: &[ClassifierRecord],
    max_age_days: u32,
    now: NaiveDateTime,
) -> ClassifierValues {
    let mut bust: Option<(NaiveDateTime, Option<f64>)> = None;
    let mut breakout: Option<(NaiveDateTime, Option<f64>)> = None;

    for rec in records {
        let slot = match rec.model_kind {
            ModelKind::Bust => &mut bust,
            ModelKind::Breakout => &mut breakout,
            ModelKind::Other => continue,
        };
        let Some(ts) = qualifying_timestamp(rec.timestamp.as_deref(), now, max_age_days) else {
            continue;
        };
        if slot.map_or(true, |(best_ts, _)| ts > best_ts) {
            *slot = Some((ts, rec.normalized_result));
        }
    }

    ClassifierValues {
        bust: bust.and_then(|(_, v)| v),
        breakout: breakout.and_then(|(_, v)| v),
    }
}

/// [`select_classifiers_at`] against the local wall clock.
pub fn select_classifiers(records: &[ClassifierRecord], max_age_days: u32) -> ClassifierValues {
    select_classifiers_at(records, max_age_days, now_local())
}

/// Select from a tagged response using the window for its feed.
pub fn select_at(
    records: &FeedRecords,
    windows: &FreshnessWindows,
    now: NaiveDateTime,
) -> FeedValues {
    match records {
        FeedRecords::Projection(recs) => {
            FeedValues::Projection(select_projection_at(recs, windows.projection_days, now))
        }
        FeedRecords::Classifier(recs) => {
            FeedValues::Classifier(select_classifiers_at(recs, windows.classifier_days, now))
        }
    }
}

/// [`select_at`] against the local wall clock.
pub fn select(records: &FeedRecords, windows: &FreshnessWindows) -> FeedValues {
    select_at(records, windows, now_local())
}
