//! Playback-related type definitions
//!
//! Supporting types for playback state and playback provenance.

use serde::{Deserialize, Serialize};

/// Playback state enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    Playing,
    Paused,
    Stopped,
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackState::Playing => write!(f, "playing"),
            PlaybackState::Paused => write!(f, "paused"),
            PlaybackState::Stopped => write!(f, "stopped"),
        }
    }
}

/// Kind of collection a playback session was started from
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ContextKind {
    Album,
    Playlist,
    Favorites,
    Search,
    #[default]
    None,
}

impl std::fmt::Display for ContextKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContextKind::Album => write!(f, "Album"),
            ContextKind::Playlist => write!(f, "Playlist"),
            ContextKind::Favorites => write!(f, "Favorites"),
            ContextKind::Search => write!(f, "Search"),
            ContextKind::None => write!(f, "None"),
        }
    }
}

/// Origin collection of the current playback session
///
/// `id` identifies the album/playlist/search; favorites and `None` usually
/// carry no id.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlaybackContext {
    pub kind: ContextKind,
    #[serde(default)]
    pub id: Option<String>,
}

impl PlaybackContext {
    pub fn new(kind: ContextKind, id: Option<String>) -> Self {
        Self { kind, id }
    }

    pub fn album(id: impl Into<String>) -> Self {
        Self::new(ContextKind::Album, Some(id.into()))
    }

    pub fn playlist(id: impl Into<String>) -> Self {
        Self::new(ContextKind::Playlist, Some(id.into()))
    }

    pub fn favorites() -> Self {
        Self::new(ContextKind::Favorites, None)
    }

    pub fn search(query: impl Into<String>) -> Self {
        Self::new(ContextKind::Search, Some(query.into()))
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_none(&self) -> bool {
        self.kind == ContextKind::None
    }
}
