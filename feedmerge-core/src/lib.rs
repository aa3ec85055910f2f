//! FeedMerge Core — domain types, feed clients, record selection, roster input.
//!
//! This crate holds everything that works on a single entity:
//! - Domain types (entities, feed records, merged result rows)
//! - The `FeedClient` trait and its HTTP implementation
//! - Freshest-record selection per feed and per classifier model
//! - Roster loading from CSV

pub mod domain;
pub mod feed;
pub mod roster;
pub mod select;

pub use domain::{Entity, EntityId, EntityResult, FeedKind, FeedRecords, FeedValues};
pub use feed::{FeedClient, FeedEndpoints, FetchError, HttpFeedClient};
pub use roster::{Roster, RosterError};
pub use select::FreshnessWindows;
