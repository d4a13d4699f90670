//! Playback engine, queue, provenance and presentation

pub mod context;
pub mod engine;
pub mod presentation;
pub mod queue;
pub mod resource;

pub use context::PlaybackContextTracker;
pub use engine::PlaybackEngine;
pub use presentation::{AutoOpenPolicy, PresentationController};
pub use queue::QueueManager;
pub use resource::{PlaybackResource, ResourceFuture, SilentResource};
