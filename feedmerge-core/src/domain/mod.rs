//! Core domain types: entities, feed records, merged result rows.

pub mod entity;
pub mod feed;
pub mod result;

pub use entity::{Entity, EntityId};
pub use feed::{ClassifierRecord, FeedKind, FeedRecords, ModelKind, ProjectionRecord};
pub use result::{
    ClassifierValues, EntityResult, FeedValues, ProjectionValues, COLUMNS, NUMERIC_COLUMNS,
};
