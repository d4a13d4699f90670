//! Test helper modules for hymnal-session integration tests
//!
//! Provides reusable test infrastructure components:
//! - FakeApi: scripted RemoteApi that records every call
//! - FakeResource: scripted PlaybackResource that records every command
//! - TrackBuilder / fixtures: catalog values and a ready-made session

#![allow(dead_code)]

pub mod fake_api;
pub mod fake_resource;
pub mod fixtures;

pub use fake_api::{gate, ApiCall, FakeApi, Reply};
pub use fake_resource::{FakeResource, ResourceCall};
pub use fixtures::{drain_events, settle, t0, test_session, track, tracks, TestSession, TrackBuilder};
