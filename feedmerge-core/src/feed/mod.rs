//! Remote feed access: the client trait and its HTTP implementation.

pub mod http;
pub mod provider;

pub use http::{FeedEndpoints, HttpFeedClient};
pub use provider::{FeedClient, FetchError};
