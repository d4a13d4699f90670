//! Remote API seam
//!
//! The session core talks to the catalog/favorites backend only through
//! [`RemoteApi`]. Every operation prepares its request synchronously and
//! returns a `'static` future that owns its inputs, so callers can spawn it
//! and requests leave in the order they were issued.
//!
//! Wire contract: every response body is `{ "data": ... }` or
//! `{ "error": "..." }`.

mod http;

pub use http::HttpApi;

use futures::future::BoxFuture;
use hymnal_common::model::PlayStartedEvent;
use hymnal_common::{FavoriteRecord, HomeFeed, Track, TrackId, UserId};
use serde::Deserialize;

use crate::error::{Error, Result};

/// Future returned by every remote operation
pub type ApiFuture<T> = BoxFuture<'static, Result<T>>;

/// Remote backend operations consumed by the session core
pub trait RemoteApi: Send + Sync {
    /// Full hymn catalog
    fn fetch_tracks(&self) -> ApiFuture<Vec<Track>>;

    /// Authoritative favorites list for a user
    fn fetch_favorites(&self, user: &UserId) -> ApiFuture<Vec<FavoriteRecord>>;

    fn add_favorite(&self, user: &UserId, track: &TrackId) -> ApiFuture<()>;

    fn remove_favorite(&self, user: &UserId, track: &TrackId) -> ApiFuture<()>;

    /// Fire-and-forget analytics beacon
    fn post_play_started(&self, event: PlayStartedEvent) -> ApiFuture<()>;

    /// Aggregated home feed
    fn fetch_home_feed(&self) -> ApiFuture<HomeFeed>;
}

/// `{data} | {error}` response envelope
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ApiEnvelope<T> {
    Error { error: String },
    Data { data: T },
}

impl<T> ApiEnvelope<T> {
    pub fn into_result(self) -> Result<T> {
        match self {
            ApiEnvelope::Data { data } => Ok(data),
            ApiEnvelope::Error { error } => Err(Error::Api(error)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_data() {
        let envelope: ApiEnvelope<Vec<u32>> = serde_json::from_str(r#"{"data": [1, 2]}"#).unwrap();
        assert_eq!(envelope.into_result().unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_envelope_error() {
        let envelope: ApiEnvelope<Vec<u32>> =
            serde_json::from_str(r#"{"error": "hymn not found"}"#).unwrap();
        match envelope.into_result() {
            Err(Error::Api(msg)) => assert_eq!(msg, "hymn not found"),
            other => panic!("expected API error, got {:?}", other),
        }
    }

    #[test]
    fn test_envelope_null_data_for_mutations() {
        let envelope: ApiEnvelope<serde_json::Value> =
            serde_json::from_str(r#"{"data": null}"#).unwrap();
        assert!(envelope.into_result().is_ok());
    }
}
