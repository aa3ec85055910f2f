//! Feed client trait and structured error types.
//!
//! The FeedClient trait abstracts over where feed records come from (the HTTP
//! feeds in production, in-memory fixtures in tests) so the batch fetcher
//! never depends on the transport.

use crate::domain::{EntityId, FeedKind, FeedRecords};
use thiserror::Error;

/// Why a fetch produced no usable response.
///
/// A non-200 status is not an error: clients report it as an empty record
/// list. Both variants are logged by the caller and treated as "no data for
/// this entity/feed"; neither aborts a batch.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error fetching {feed_kind} feed for entity {entity_id}: {message}")]
    Network {
        entity_id: EntityId,
        feed_kind: FeedKind,
        message: String,
    },

    #[error("malformed {feed_kind} response for entity {entity_id}: {message}")]
    Malformed {
        entity_id: EntityId,
        feed_kind: FeedKind,
        message: String,
    },
}

impl FetchError {
    pub fn entity_id(&self) -> EntityId {
        match self {
            FetchError::Network { entity_id, .. } | FetchError::Malformed { entity_id, .. } => {
                *entity_id
            }
        }
    }

    pub fn feed_kind(&self) -> FeedKind {
        match self {
            FetchError::Network { feed_kind, .. } | FetchError::Malformed { feed_kind, .. } => {
                *feed_kind
            }
        }
    }
}

/// Source of feed records for one entity.
///
/// Implementations perform exactly one read per call. Pacing between calls
/// is the caller's concern.
pub trait FeedClient: Send + Sync {
    /// Human-readable name of this client.
    fn name(&self) -> &str;

    /// Fetch all records the given feed holds for an entity.
    fn fetch(&self, entity_id: EntityId, kind: FeedKind) -> Result<FeedRecords, FetchError>;
}
