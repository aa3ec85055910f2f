//! Serializable pipeline configuration.
//!
//! Every tunable of a run lives here: batching, worker pool size, pacing,
//! per-feed freshness windows and the feed endpoints. Loadable from TOML;
//! missing keys fall back to the defaults.

use feedmerge_core::feed::http::{
    DEFAULT_CLASSIFIER_URL, DEFAULT_PROJECTION_URL, DEFAULT_SEASON,
};
use feedmerge_core::select::{DEFAULT_CLASSIFIER_MAX_AGE_DAYS, DEFAULT_PROJECTION_MAX_AGE_DAYS};
use feedmerge_core::{FeedEndpoints, FreshnessWindows};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialize config TOML: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Complete configuration for one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    // ── Batching ──
    /// Entities per batch. Batches run strictly one after another.
    pub batch_size: usize,
    /// Buffered entities that trigger a flush to scratch. Defaults to `batch_size`
    /// and must be a multiple of it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flush_threshold: Option<usize>,

    // ── Concurrency ──
    /// Fetches in flight at once within a batch.
    pub workers: usize,
    /// Delay before each fetch, per worker.
    pub pacing_ms: u64,
    pub request_timeout_secs: u64,

    // ── Freshness ──
    pub projection_max_age_days: u32,
    pub classifier_max_age_days: u32,

    // ── Feeds ──
    pub season: u32,
    pub projection_url: String,
    pub classifier_url: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            flush_threshold: None,
            workers: 5,
            pacing_ms: 100,
            request_timeout_secs: 30,
            projection_max_age_days: DEFAULT_PROJECTION_MAX_AGE_DAYS,
            classifier_max_age_days: DEFAULT_CLASSIFIER_MAX_AGE_DAYS,
            season: DEFAULT_SEASON,
            projection_url: DEFAULT_PROJECTION_URL.to_string(),
            classifier_url: DEFAULT_CLASSIFIER_URL.to_string(),
        }
    }
}

impl PipelineConfig {
    /// Load a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Serialize the config to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject configurations that cannot run or would break the memory bound.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid("batch_size must be at least 1".into()));
        }
        if self.workers == 0 {
            return Err(ConfigError::Invalid("workers must be at least 1".into()));
        }
        // The store only flushes between batches, so it grows in whole batches.
        let threshold = self.flush_threshold();
        if threshold < self.batch_size || threshold % self.batch_size != 0 {
            return Err(ConfigError::Invalid(format!(
                "flush_threshold ({threshold}) must be a positive multiple of batch_size ({})",
                self.batch_size
            )));
        }
        for (name, url) in [
            ("projection_url", &self.projection_url),
            ("classifier_url", &self.classifier_url),
        ] {
            if !url.contains("{id}") {
                return Err(ConfigError::Invalid(format!(
                    "{name} must contain an {{id}} placeholder"
                )));
            }
        }
        Ok(())
    }

    /// Change the batch size, dropping a pinned threshold that no longer
    /// spans whole batches.
    pub fn set_batch_size(&mut self, batch_size: usize) {
        self.batch_size = batch_size;
        if self
            .flush_threshold
            .is_some_and(|t| batch_size == 0 || t < batch_size || t % batch_size != 0)
        {
            self.flush_threshold = None;
        }
    }

    pub fn flush_threshold(&self) -> usize {
        self.flush_threshold.unwrap_or(self.batch_size)
    }

    pub fn windows(&self) -> FreshnessWindows {
        FreshnessWindows {
            projection_days: self.projection_max_age_days,
            classifier_days: self.classifier_max_age_days,
        }
    }

    pub fn endpoints(&self) -> FeedEndpoints {
        FeedEndpoints {
            projection_url: self.projection_url.clone(),
            classifier_url: self.classifier_url.clone(),
            season: self.season,
        }
    }

    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
