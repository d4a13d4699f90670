//! # Hymnal Session Core (hymnal-session)
//!
//! Process-wide playback and favorites state for the hymnal client.
//!
//! **Purpose:** Own the single playback resource, keep the upcoming-track
//! queue and playback provenance, drive the full-screen player flag, and keep
//! a per-user favorites cache that mutates optimistically and reconciles
//! against the remote favorites store.
//!
//! **Architecture:** One `SharedState` behind an `Arc`, mutated only through
//! the component types below. Remote calls and resource starts run as spawned
//! tokio tasks; their completions reconcile state when they settle. The
//! `Session` root object composes everything and is what UI code holds.

pub mod api;
pub mod config;
pub mod error;
pub mod favorites;
pub mod feed;
pub mod playback;
pub mod session;
pub mod state;
pub mod storage;

pub use error::{Error, Result};
pub use session::Session;
pub use state::{Notice, PlaybackSnapshot, SharedState};
