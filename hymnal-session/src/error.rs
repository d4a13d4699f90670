//! Error types for hymnal-session
//!
//! Most of these never reach UI code: network and media failures are absorbed
//! at the component boundary and turned into observable state (a stale cache,
//! `is_playing == false`, a dismissible notice). They still flow through
//! `Result` internally so the absorbing code can log what went wrong.

use std::time::Duration;
use thiserror::Error;

/// Main error type for hymnal-session
#[derive(Error, Debug)]
pub enum Error {
    /// Request failed or could not be sent
    #[error("Network error: {0}")]
    Network(String),

    /// Server answered with an `{ "error": ... }` envelope or error status
    #[error("API error: {0}")]
    Api(String),

    /// Playback resource failed to start a track
    #[error("Media load error: {0}")]
    MediaLoad(String),

    /// Favorite mutation attempted without an authenticated user
    #[error("Authentication required")]
    AuthRequired,

    /// Operation exceeded its time bound
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// A result arrived after a newer operation superseded it
    #[error("Stale result discarded: {0}")]
    ReconciliationConflict(String),

    /// Local persistent storage failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration file loading or validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors from shared hymnal-common helpers
    #[error(transparent)]
    Common(#[from] hymnal_common::Error),
}

/// Convenience Result type using hymnal-session Error
pub type Result<T> = std::result::Result<T, Error>;

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Error::Network(format!("request timed out: {}", e))
        } else {
            Error::Network(e.to_string())
        }
    }
}
