//! Shared session state
//!
//! The one authoritative copy of "what is playing" for the whole process.
//! Components hold an `Arc<SharedState>` and mutate it only through the
//! crate-internal `update_playback`; everyone else gets read accessors and
//! snapshots.
//!
//! Locks are `std::sync` and are never held across an `.await`, so every
//! mutation is atomic with respect to the event loop.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use hymnal_common::events::{EventBus, PlaybackContext, PlaybackState, SessionEvent};
use hymnal_common::{Track, UserId};
use tokio::sync::broadcast;

/// Event channel depth; lagging subscribers drop the oldest events
const EVENT_CAPACITY: usize = 256;

/// Dismissible user-facing notice (failed play, failed favorite sync)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub raised_at: chrono::DateTime<chrono::Utc>,
}

/// Playback session data
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct PlaybackSession {
    pub(crate) current_track: Option<Track>,
    pub(crate) is_playing: bool,
    pub(crate) queue: Vec<Track>,
    pub(crate) context: PlaybackContext,
    pub(crate) full_screen_open: bool,
}

impl PlaybackSession {
    pub(crate) fn playback_state(&self) -> PlaybackState {
        match (&self.current_track, self.is_playing) {
            (Some(_), true) => PlaybackState::Playing,
            (Some(_), false) => PlaybackState::Paused,
            (None, _) => PlaybackState::Stopped,
        }
    }

    /// Restore invariants after a mutation
    ///
    /// - playing requires a current track
    /// - the queue never starts with the current track
    fn normalize(&mut self) {
        if self.current_track.is_none() {
            self.is_playing = false;
        }
        if let Some(current) = &self.current_track {
            while self.queue.first().is_some_and(|head| head.same_track(current)) {
                self.queue.remove(0);
            }
        }
    }
}

/// Read-only copy of the playback session
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSnapshot {
    pub current_track: Option<Track>,
    pub is_playing: bool,
    pub queue: Vec<Track>,
    pub context: PlaybackContext,
    pub full_screen_open: bool,
}

/// Shared state accessible by all components
pub struct SharedState {
    playback: RwLock<PlaybackSession>,

    /// Authenticated user, if any
    user: RwLock<Option<UserId>>,

    /// Most recent unacknowledged notice
    notice: RwLock<Option<Notice>>,

    events: EventBus,
}

impl SharedState {
    /// Create new shared state with nothing playing and no user
    pub fn new() -> Self {
        Self {
            playback: RwLock::new(PlaybackSession::default()),
            user: RwLock::new(None),
            notice: RwLock::new(None),
            events: EventBus::new(EVENT_CAPACITY),
        }
    }

    fn read_playback(&self) -> RwLockReadGuard<'_, PlaybackSession> {
        self.playback.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_playback(&self) -> RwLockWriteGuard<'_, PlaybackSession> {
        self.playback.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Apply a mutation to the playback session and restore invariants
    pub(crate) fn update_playback<R>(&self, f: impl FnOnce(&mut PlaybackSession) -> R) -> R {
        let mut session = self.write_playback();
        let result = f(&mut session);
        session.normalize();
        result
    }

    /// Swap in a rebuilt queue, returning its length
    ///
    /// The head is not checked against the current track: a rebuilt queue
    /// follows an anchor that is about to become current.
    pub(crate) fn replace_queue(&self, queue: Vec<Track>) -> usize {
        let mut session = self.write_playback();
        session.queue = queue;
        session.queue.len()
    }

    /// Read a projection of the playback session under the lock
    pub(crate) fn with_playback<R>(&self, f: impl FnOnce(&PlaybackSession) -> R) -> R {
        f(&self.read_playback())
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        let session = self.read_playback();
        PlaybackSnapshot {
            current_track: session.current_track.clone(),
            is_playing: session.is_playing,
            queue: session.queue.clone(),
            context: session.context.clone(),
            full_screen_open: session.full_screen_open,
        }
    }

    pub fn current_track(&self) -> Option<Track> {
        self.read_playback().current_track.clone()
    }

    pub fn is_playing(&self) -> bool {
        self.read_playback().is_playing
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.read_playback().playback_state()
    }

    pub fn queue(&self) -> Vec<Track> {
        self.read_playback().queue.clone()
    }

    pub fn playback_context(&self) -> PlaybackContext {
        self.read_playback().context.clone()
    }

    pub fn is_full_screen_open(&self) -> bool {
        self.read_playback().full_screen_open
    }

    /// Get the authenticated user
    pub fn current_user(&self) -> Option<UserId> {
        self.user.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub(crate) fn set_current_user(&self, user: Option<UserId>) {
        *self.user.write().unwrap_or_else(|e| e.into_inner()) = user.clone();
        self.broadcast_event(SessionEvent::UserChanged {
            user_id: user,
            timestamp: chrono::Utc::now(),
        });
    }

    /// Record a dismissible notice and announce it
    pub(crate) fn raise_notice(&self, message: impl Into<String>) {
        let notice = Notice {
            message: message.into(),
            raised_at: chrono::Utc::now(),
        };
        self.broadcast_event(SessionEvent::NoticeRaised {
            message: notice.message.clone(),
            timestamp: notice.raised_at,
        });
        *self.notice.write().unwrap_or_else(|e| e.into_inner()) = Some(notice);
    }

    pub fn notice(&self) -> Option<Notice> {
        self.notice.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn dismiss_notice(&self) {
        *self.notice.write().unwrap_or_else(|e| e.into_inner()) = None;
    }

    /// Broadcast an event to all subscribers
    pub fn broadcast_event(&self, event: SessionEvent) {
        // No receivers is OK
        self.events.emit_lossy(event);
    }

    /// Subscribe to the session event stream
    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}
