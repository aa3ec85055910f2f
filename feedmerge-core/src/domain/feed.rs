//! Feed kinds and the raw records each feed serves.
//!
//! Records keep their timestamp as the text the feed sent. Parsing happens in
//! the selector so a single bad timestamp drops one record, never the whole
//! response.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// The two independent feeds fetched per entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedKind {
    Projection,
    Classifier,
}

impl FeedKind {
    pub const ALL: [FeedKind; 2] = [FeedKind::Projection, FeedKind::Classifier];

    pub fn as_str(&self) -> &'static str {
        match self {
            FeedKind::Projection => "projection",
            FeedKind::Classifier => "classifier",
        }
    }
}

impl fmt::Display for FeedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifier model carried by a classifier record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum ModelKind {
    Bust,
    Breakout,
    /// Any model type this pipeline does not merge.
    #[default]
    Other,
}

impl From<String> for ModelKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "bust_classifier" => ModelKind::Bust,
            "breakout_classifier" => ModelKind::Breakout,
            _ => ModelKind::Other,
        }
    }
}

/// One projection observation.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ProjectionRecord {
    #[serde(rename = "EXECUTION_TIMESTAMP", default)]
    pub timestamp: Option<String>,
    #[serde(rename = "SCORE_PROJECTION", default, deserialize_with = "lenient_f64")]
    pub score: Option<f64>,
    #[serde(rename = "LOW_SCORE", default, deserialize_with = "lenient_f64")]
    pub low: Option<f64>,
    #[serde(rename = "HIGH_SCORE", default, deserialize_with = "lenient_f64")]
    pub high: Option<f64>,
}

/// One classifier observation (bust or breakout model output).
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ClassifierRecord {
    #[serde(rename = "EXECUTION_TIMESTAMP", default)]
    pub timestamp: Option<String>,
    #[serde(rename = "MODEL_TYPE", default)]
    pub model_kind: ModelKind,
    #[serde(rename = "NORMALIZED_RESULT", default, deserialize_with = "lenient_f64")]
    pub normalized_result: Option<f64>,
}

/// Records returned by one fetch, tagged by the feed they came from.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedRecords {
    Projection(Vec<ProjectionRecord>),
    Classifier(Vec<ClassifierRecord>),
}

impl FeedRecords {
    /// An empty response for the given feed ("no data").
    pub fn empty(kind: FeedKind) -> Self {
        match kind {
            FeedKind::Projection => FeedRecords::Projection(Vec::new()),
            FeedKind::Classifier => FeedRecords::Classifier(Vec::new()),
        }
    }

    pub fn kind(&self) -> FeedKind {
        match self {
            FeedRecords::Projection(_) => FeedKind::Projection,
            FeedRecords::Classifier(_) => FeedKind::Classifier,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            FeedRecords::Projection(r) => r.len(),
            FeedRecords::Classifier(r) => r.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Accepts a JSON number, a numeric string, or null. Anything else is absent.
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}
