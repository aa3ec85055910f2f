//! HTTP feed client.
//!
//! Each feed is a static JSON document per entity and season, addressed by a
//! URL template. A 200 response carries a JSON array of records; any other
//! status means the feed has nothing for that entity.

use super::provider::{FeedClient, FetchError};
use crate::domain::{ClassifierRecord, EntityId, FeedKind, FeedRecords, ProjectionRecord};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_PROJECTION_URL: &str = "https://watsonfantasyfootball.espn.com/espnpartner/dallas/projections/projections_{id}_ESPNFantasyFootball_{season}.json";
pub const DEFAULT_CLASSIFIER_URL: &str = "https://watsonfantasyfootball.espn.com/espnpartner/dallas/classifiers/classifiers_{id}_ESPNFantasyFootball_{season}.json";
pub const DEFAULT_SEASON: u32 = 2025;

/// URL templates for both feeds. `{id}` and `{season}` are substituted per call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedEndpoints {
    pub projection_url: String,
    pub classifier_url: String,
    pub season: u32,
}

impl Default for FeedEndpoints {
    fn default() -> Self {
        Self {
            projection_url: DEFAULT_PROJECTION_URL.to_string(),
            classifier_url: DEFAULT_CLASSIFIER_URL.to_string(),
            season: DEFAULT_SEASON,
        }
    }
}

impl FeedEndpoints {
    /// Resolve the resource URL for one entity and feed.
    pub fn url(&self, entity_id: EntityId, kind: FeedKind) -> String {
        let template = match kind {
            FeedKind::Projection => &self.projection_url,
            FeedKind::Classifier => &self.classifier_url,
        };
        template
            .replace("{id}", &entity_id.to_string())
            .replace("{season}", &self.season.to_string())
    }
}

/// Feed client backed by a blocking reqwest client.
pub struct HttpFeedClient {
    client: reqwest::blocking::Client,
    endpoints: FeedEndpoints,
}

impl HttpFeedClient {
    pub fn new(endpoints: FeedEndpoints, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("feedmerge/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, endpoints })
    }

    pub fn endpoints(&self) -> &FeedEndpoints {
        &self.endpoints
    }

    /// Parse a 200 body into records of the requested shape.
    fn parse_body(
        entity_id: EntityId,
        kind: FeedKind,
        body: &str,
    ) -> Result<FeedRecords, FetchError> {
        let malformed = |e: serde_json::Error| FetchError::Malformed {
            entity_id,
            feed_kind: kind,
            message: e.to_string(),
        };
        match kind {
            FeedKind::Projection => serde_json::from_str::<Vec<ProjectionRecord>>(body)
                .map(FeedRecords::Projection)
                .map_err(malformed),
            FeedKind::Classifier => serde_json::from_str::<Vec<ClassifierRecord>>(body)
                .map(FeedRecords::Classifier)
                .map_err(malformed),
        }
    }
}

impl FeedClient for HttpFeedClient {
    fn name(&self) -> &str {
        "http"
    }

    fn fetch(&self, entity_id: EntityId, kind: FeedKind) -> Result<FeedRecords, FetchError> {
        let url = self.endpoints.url(entity_id, kind);
        let network = |e: reqwest::Error| FetchError::Network {
            entity_id,
            feed_kind: kind,
            message: e.to_string(),
        };

        let resp = self.client.get(&url).send().map_err(network)?;
        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            debug!(entity_id = %entity_id, feed = %kind, %status, "feed has no data");
            return Ok(FeedRecords::empty(kind));
        }

        let body = resp.text().map_err(network)?;
        let records = Self::parse_body(entity_id, kind, &body)?;
        debug!(entity_id = %entity_id, feed = %kind, count = records.len(), "fetched records");
        Ok(records)
    }
}
