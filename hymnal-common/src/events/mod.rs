//! Event types for the hymnal event system
//!
//! Provides the shared event definitions and the EventBus every UI surface
//! subscribes to. Surfaces never talk to each other; they observe these events
//! (or read session state directly) to stay consistent.

mod playback_types;
mod queue_types;

pub use playback_types::{ContextKind, PlaybackContext, PlaybackState};
pub use queue_types::{FavoriteState, QueueChangeTrigger};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::model::{TrackId, UserId};

/// Session event types
///
/// Events are broadcast via EventBus and can be serialized for transport to
/// out-of-process views.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    /// Playback state changed (Playing / Paused / Stopped)
    PlaybackStateChanged {
        old_state: PlaybackState,
        new_state: PlaybackState,
        /// Track current after the change
        track_id: Option<TrackId>,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A play request was issued for a track
    ///
    /// Emitted when state flips, before the resource confirms the start.
    TrackStarted {
        track_id: TrackId,
        /// Correlates with the analytics beacon
        play_id: Uuid,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The playback resource failed to start a track
    PlaybackFailed {
        track_id: TrackId,
        reason: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Queue contents changed
    QueueChanged {
        queue: Vec<TrackId>,
        trigger: QueueChangeTrigger,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Playback provenance changed
    ContextChanged {
        context: PlaybackContext,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Full-screen player opened or closed
    FullScreenChanged {
        open: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Favorite membership of one track changed (including optimistic states)
    FavoriteChanged {
        track_id: TrackId,
        state: FavoriteState,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Favorites list loaded, or load failed and the cache went stale
    FavoritesLoaded {
        user_id: UserId,
        count: usize,
        stale: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Home feed replaced
    HomeFeedUpdated {
        generation: u64,
        fallback: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Dismissible notice raised (failed play, failed favorite sync)
    NoticeRaised {
        message: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// User logged in or out
    UserChanged {
        user_id: Option<UserId>,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

/// Central event distribution bus
///
/// Thin wrapper over `tokio::sync::broadcast`. Slow subscribers lag and drop
/// old events rather than blocking emitters.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SessionEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Examples
    ///
    /// ```
    /// use hymnal_common::events::EventBus;
    ///
    /// let event_bus = EventBus::new(256);
    /// assert_eq!(event_bus.capacity(), 256);
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: SessionEvent,
    ) -> Result<usize, broadcast::error::SendError<SessionEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    ///
    /// # Examples
    ///
    /// ```
    /// use hymnal_common::events::{EventBus, SessionEvent};
    ///
    /// let event_bus = EventBus::new(16);
    ///
    /// // OK if no one is listening
    /// event_bus.emit_lossy(SessionEvent::FullScreenChanged {
    ///     open: true,
    ///     timestamp: chrono::Utc::now(),
    /// });
    /// ```
    pub fn emit_lossy(&self, event: SessionEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
