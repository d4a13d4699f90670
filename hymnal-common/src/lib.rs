//! # Hymnal Common Library
//!
//! Shared code for the hymnal client crates including:
//! - Catalog value types (Track, FavoriteRecord, HomeFeed)
//! - Event types (SessionEvent enum) and the EventBus
//! - Configuration loading
//! - Time utilities (clock abstraction, day arithmetic, track durations)

pub mod config;
pub mod error;
pub mod events;
pub mod human_time;
pub mod model;
pub mod time;

pub use error::{Error, Result};
pub use model::{FavoriteRecord, HomeFeed, Track, TrackId, UserId};
