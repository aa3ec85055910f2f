//! FeedMerge Runner — batch orchestration, aggregation, spill and export.
//!
//! This crate builds on `feedmerge-core` to provide:
//! - Pipeline configuration (TOML, defaults, validation)
//! - Bounded-concurrency batch fetching over a Rayon worker pool
//! - A concurrency-safe aggregation store with threshold flushing
//! - Append-only CSV scratch storage and final consolidation
//! - CSV and Parquet artifact writers
//! - Progress reporting

pub mod batch;
pub mod config;
pub mod export;
pub mod pipeline;
pub mod progress;
pub mod scratch;
pub mod store;

pub use batch::{BatchFetcher, BatchReport};
pub use config::{ConfigError, PipelineConfig};
pub use export::{CsvOutput, ExportError, OutputFormat, OutputWriter, ParquetOutput};
pub use pipeline::{consolidate, run_pipeline, PipelineError, PipelineSummary};
pub use progress::{PipelineProgress, SilentProgress, StdoutProgress};
pub use scratch::{ScratchError, ScratchFile};
pub use store::AggregationStore;

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn store_is_send_sync() {
        assert_send::<AggregationStore>();
        assert_sync::<AggregationStore>();
    }

    #[test]
    fn fetcher_is_shareable_across_workers() {
        assert_sync::<BatchFetcher<'static>>();
    }

    #[test]
    fn config_and_reports_are_send_sync() {
        assert_send::<PipelineConfig>();
        assert_sync::<PipelineConfig>();
        assert_send::<BatchReport>();
        assert_send::<PipelineSummary>();
        assert_send::<PipelineError>();
    }
}
