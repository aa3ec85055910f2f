//! Merged per-entity output rows.

use super::entity::{Entity, EntityId};
use super::feed::FeedKind;
use serde::{Deserialize, Serialize};

/// Fixed column order shared by scratch chunks and the final artifact.
pub const COLUMNS: [&str; 9] = [
    "name",
    "id",
    "position",
    "team",
    "score_projection",
    "low_score",
    "high_score",
    "bust",
    "breakout",
];

/// Numeric columns coerced during consolidation.
pub const NUMERIC_COLUMNS: [&str; 5] = [
    "score_projection",
    "low_score",
    "high_score",
    "bust",
    "breakout",
];

/// Values extracted from the freshest qualifying projection record.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ProjectionValues {
    pub score: Option<f64>,
    pub low: Option<f64>,
    pub high: Option<f64>,
}

/// Values extracted from the freshest qualifying record of each classifier model.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ClassifierValues {
    pub bust: Option<f64>,
    pub breakout: Option<f64>,
}

/// Selector output for one feed of one entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeedValues {
    Projection(ProjectionValues),
    Classifier(ClassifierValues),
}

impl FeedValues {
    /// The "no usable record" value for a feed.
    pub fn absent(kind: FeedKind) -> Self {
        match kind {
            FeedKind::Projection => FeedValues::Projection(ProjectionValues::default()),
            FeedKind::Classifier => FeedValues::Classifier(ClassifierValues::default()),
        }
    }

    pub fn kind(&self) -> FeedKind {
        match self {
            FeedValues::Projection(_) => FeedKind::Projection,
            FeedValues::Classifier(_) => FeedKind::Classifier,
        }
    }
}

/// One row of the final dataset. Field order matches [`COLUMNS`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityResult {
    pub name: String,
    pub id: EntityId,
    pub position: String,
    pub team: String,
    pub score_projection: Option<f64>,
    pub low_score: Option<f64>,
    pub high_score: Option<f64>,
    pub bust: Option<f64>,
    pub breakout: Option<f64>,
}

impl EntityResult {
    /// A row carrying only roster metadata; every feed field absent.
    pub fn for_entity(entity: &Entity) -> Self {
        Self {
            name: entity.name.clone(),
            id: entity.id,
            position: entity.position.clone(),
            team: entity.team.clone(),
            score_projection: None,
            low_score: None,
            high_score: None,
            bust: None,
            breakout: None,
        }
    }

    /// Overwrite the fields owned by `values`' feed.
    pub fn apply(&mut self, values: &FeedValues) {
        match values {
            FeedValues::Projection(p) => {
                self.score_projection = p.score;
                self.low_score = p.low;
                self.high_score = p.high;
            }
            FeedValues::Classifier(c) => {
                self.bust = c.bust;
                self.breakout = c.breakout;
            }
        }
    }

    /// Merge a later row for the same entity. Present values in `later` win;
    /// absent values never erase present ones.
    pub fn merge(&mut self, later: EntityResult) {
        debug_assert_eq!(self.id, later.id);
        fn take(slot: &mut Option<f64>, later: Option<f64>) {
            if later.is_some() {
                *slot = later;
            }
        }
        take(&mut self.score_projection, later.score_projection);
        take(&mut self.low_score, later.low_score);
        take(&mut self.high_score, later.high_score);
        take(&mut self.bust, later.bust);
        take(&mut self.breakout, later.breakout);
        if !later.name.is_empty() {
            self.name = later.name;
        }
        if !later.position.is_empty() {
            self.position = later.position;
        }
        if !later.team.is_empty() {
            self.team = later.team;
        }
    }

    /// True when no feed contributed a value.
    pub fn has_no_feed_data(&self) -> bool {
        self.score_projection.is_none()
            && self.low_score.is_none()
            && self.high_score.is_none()
            && self.bust.is_none()
            && self.breakout.is_none()
    }
}
