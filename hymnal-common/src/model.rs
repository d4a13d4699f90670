//! Catalog and user value types
//!
//! These mirror the JSON bodies returned by the hymn catalog API. Field names
//! are camelCase on the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

use crate::human_time::parse_track_duration;

/// Catalog identifier of a track (hymn)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(String);

impl TrackId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TrackId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TrackId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Identifier of an authenticated user
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A playable hymn
///
/// Built once from an API response and never mutated afterwards; consumers
/// pass clones around freely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: TrackId,
    pub title: String,
    /// Hymn number within its hymnal, if catalogued
    #[serde(default)]
    pub number: Option<u32>,
    #[serde(default)]
    pub category: Option<String>,
    /// Composer or performing artist
    #[serde(default, alias = "artist")]
    pub composer: Option<String>,
    /// Display duration as delivered by the API (`mm:ss`)
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub cover_url: Option<String>,
    pub audio_url: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Track {
    /// Parsed playing time, `None` when missing or malformed
    pub fn duration(&self) -> Option<Duration> {
        self.duration.as_deref().and_then(parse_track_duration)
    }

    /// Same catalog entry, ignoring metadata differences between API payloads
    pub fn same_track(&self, other: &Track) -> bool {
        self.id == other.id
    }
}

/// Favorite membership as reported by the remote favorites store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteRecord {
    #[serde(alias = "hymnId")]
    pub track_id: TrackId,
    pub added_at: DateTime<Utc>,
}

/// Aggregated home-feed payload
///
/// `is_fallback` is never sent by the server; it marks the substitute value
/// used when the aggregation fails or times out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeFeed {
    #[serde(default)]
    pub recent: Vec<Track>,
    #[serde(default)]
    pub popular: Vec<Track>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub composers: Vec<String>,
    #[serde(skip)]
    pub is_fallback: bool,
}

impl HomeFeed {
    /// Fallback feed: every section empty
    pub fn empty() -> Self {
        Self {
            is_fallback: true,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.recent.is_empty()
            && self.popular.is_empty()
            && self.categories.is_empty()
            && self.composers.is_empty()
    }
}

/// Body of the fire-and-forget "play started" analytics beacon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayStartedEvent {
    pub play_id: Uuid,
    pub track_id: TrackId,
    #[serde(default)]
    pub user_id: Option<UserId>,
    pub started_at: DateTime<Utc>,
}
