//! Catalog fixtures and a ready-made session

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use hymnal_common::events::SessionEvent;
use hymnal_common::time::ManualClock;
use hymnal_common::{Track, TrackId};
use hymnal_session::config::SessionConfig;
use hymnal_session::storage::MemoryStore;
use hymnal_session::Session;
use tokio::sync::broadcast;

use super::fake_api::FakeApi;
use super::fake_resource::FakeResource;

/// Builder for catalog tracks
pub struct TrackBuilder {
    track: Track,
}

impl TrackBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            track: Track {
                id: TrackId::new(id),
                title: format!("Hymn {}", id),
                number: None,
                category: None,
                composer: None,
                duration: None,
                cover_url: None,
                audio_url: format!("https://cdn.example/audio/{}.mp3", id),
                created_at: None,
            },
        }
    }

    pub fn title(mut self, title: &str) -> Self {
        self.track.title = title.to_string();
        self
    }

    pub fn number(mut self, number: u32) -> Self {
        self.track.number = Some(number);
        self
    }

    pub fn duration(mut self, duration: &str) -> Self {
        self.track.duration = Some(duration.to_string());
        self
    }

    pub fn build(self) -> Track {
        self.track
    }
}

pub fn track(id: &str) -> Track {
    TrackBuilder::new(id).build()
}

pub fn tracks(ids: &[&str]) -> Vec<Track> {
    ids.iter().map(|id| track(id)).collect()
}

/// Fixed start instant for clock-driven tests
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 10, 12, 0, 0).unwrap()
}

/// Let spawned tasks run until they block
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

/// Everything currently buffered on an event receiver
pub fn drain_events(rx: &mut broadcast::Receiver<SessionEvent>) -> Vec<SessionEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

pub struct TestSession {
    pub session: Session,
    pub api: Arc<FakeApi>,
    pub resource: FakeResource,
    pub store: Arc<MemoryStore>,
    pub clock: ManualClock,
}

/// Session over fakes with the given config
pub fn test_session(config: SessionConfig, api: FakeApi) -> TestSession {
    let api = Arc::new(api);
    let resource = FakeResource::new();
    let store = Arc::new(MemoryStore::new());
    let clock = ManualClock::new(t0());

    let session = Session::with_clock(
        config,
        api.clone(),
        Box::new(resource.clone()),
        store.clone(),
        Arc::new(clock.clone()),
    );

    TestSession {
        session,
        api,
        resource,
        store,
        clock,
    }
}
