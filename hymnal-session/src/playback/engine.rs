//! Playback engine
//!
//! Owns the session's single [`PlaybackResource`] and drives the
//! `current_track` / `is_playing` pair in [`SharedState`].
//!
//! Control methods are synchronous: state flips before they return, and the
//! resource's start outcome is reconciled later by a spawned task. A start
//! failure is never returned to the caller; it turns into `is_playing = false`,
//! a notice and a `PlaybackFailed` event. Each start carries a generation
//! number so that the outcome of a superseded request is dropped.
//!
//! All control methods must be called from within a tokio runtime.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use hymnal_common::events::{PlaybackState, QueueChangeTrigger, SessionEvent};
use hymnal_common::model::PlayStartedEvent;
use hymnal_common::{Track, TrackId};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::queue::QueueManager;
use super::resource::PlaybackResource;
use crate::api::RemoteApi;
use crate::state::SharedState;

/// Playback engine
pub struct PlaybackEngine {
    state: Arc<SharedState>,

    /// The one playback resource of the session; never handed out
    resource: Box<dyn PlaybackResource>,

    api: Arc<dyn RemoteApi>,

    queue: QueueManager,

    /// Send the "play started" beacon
    analytics_enabled: bool,

    /// Incremented by every start and stop
    play_generation: Arc<AtomicU64>,

    /// Track currently loaded in the resource (resumable)
    loaded: Arc<Mutex<Option<TrackId>>>,
}

impl PlaybackEngine {
    pub fn new(
        state: Arc<SharedState>,
        resource: Box<dyn PlaybackResource>,
        api: Arc<dyn RemoteApi>,
        queue: QueueManager,
        analytics_enabled: bool,
    ) -> Self {
        Self {
            state,
            resource,
            api,
            queue,
            analytics_enabled,
            play_generation: Arc::new(AtomicU64::new(0)),
            loaded: Arc::new(Mutex::new(None)),
        }
    }

    /// Make `track` current and start playing it
    ///
    /// Playing the paused current track resumes it; playing the track that is
    /// already playing does nothing.
    pub fn play(&self, track: Track) {
        let (already_playing, old_state) = self.state.with_playback(|s| {
            let same = s
                .current_track
                .as_ref()
                .is_some_and(|current| current.same_track(&track));
            (same && s.is_playing, s.playback_state())
        });
        if already_playing {
            debug!(track_id = %track.id, "Already playing");
            return;
        }

        let generation = self.play_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let track_id = track.id.clone();

        let resume = {
            let mut loaded = self.loaded.lock().unwrap_or_else(|e| e.into_inner());
            let resume = loaded.as_ref() == Some(&track_id);
            *loaded = Some(track_id.clone());
            resume
        };

        let queue_before = self.queue.len();
        self.state.update_playback(|s| {
            s.current_track = Some(track.clone());
            s.is_playing = true;
        });
        if self.queue.len() != queue_before {
            // Head was the track now playing
            self.queue.notify_changed(QueueChangeTrigger::Advanced);
        }

        // The load starts now; only its outcome is awaited in the background
        let outcome = if resume {
            info!(track_id = %track_id, "Resuming playback");
            self.resource.resume()
        } else {
            info!(track_id = %track_id, title = %track.title, "Starting playback");
            self.resource.start(&track)
        };

        self.emit_state_change(old_state);

        if !resume {
            let play_id = Uuid::new_v4();
            self.state.broadcast_event(SessionEvent::TrackStarted {
                track_id: track_id.clone(),
                play_id,
                timestamp: chrono::Utc::now(),
            });
            self.send_play_started(play_id, &track_id);
        }

        let state = self.state.clone();
        let current_generation = self.play_generation.clone();
        let loaded = self.loaded.clone();
        tokio::spawn(async move {
            let result = outcome.await;

            if current_generation.load(Ordering::SeqCst) != generation {
                if let Err(e) = result {
                    debug!(track_id = %track_id, "Discarding failure of superseded start: {}", e);
                }
                return;
            }

            match result {
                Ok(()) => debug!(track_id = %track_id, "Playback resource started"),
                Err(e) => {
                    warn!(track_id = %track_id, "Playback failed to start: {}", e);
                    *loaded.lock().unwrap_or_else(|e| e.into_inner()) = None;

                    let old_state = state.playback_state();
                    state.update_playback(|s| s.is_playing = false);

                    let title = state
                        .current_track()
                        .map(|t| t.title)
                        .unwrap_or_else(|| track_id.to_string());
                    state.raise_notice(format!("Could not play \"{}\"", title));
                    state.broadcast_event(SessionEvent::PlaybackFailed {
                        track_id: track_id.clone(),
                        reason: e.to_string(),
                        timestamp: chrono::Utc::now(),
                    });
                    emit_state_change(&state, old_state);
                }
            }
        });
    }

    /// Pause; the current track and the queue are kept
    pub fn pause(&self) {
        let old_state = self.state.playback_state();
        if old_state != PlaybackState::Playing {
            debug!("Pause ignored in state {}", old_state);
            return;
        }

        self.resource.pause();
        self.state.update_playback(|s| s.is_playing = false);
        info!("Playback paused");
        self.emit_state_change(old_state);
    }

    /// Pause if `track` is the playing track, otherwise play it
    ///
    /// Returns `true` when the toggle played.
    pub fn toggle(&self, track: Track) -> bool {
        let playing_this = self.state.with_playback(|s| {
            s.is_playing
                && s.current_track
                    .as_ref()
                    .is_some_and(|current| current.same_track(&track))
        });
        if playing_this {
            self.pause();
            false
        } else {
            self.play(track);
            true
        }
    }

    /// Stop and forget the current track
    pub fn stop(&self) {
        self.play_generation.fetch_add(1, Ordering::SeqCst);
        *self.loaded.lock().unwrap_or_else(|e| e.into_inner()) = None;

        let old_state = self.state.playback_state();
        self.resource.stop();
        self.state.update_playback(|s| {
            s.current_track = None;
            s.is_playing = false;
        });
        info!("Playback stopped");
        self.emit_state_change(old_state);
    }

    /// The resource finished playing `ended`
    ///
    /// Advances to the queue head, or pauses on the finished track when the
    /// queue is empty. A report for a track that is no longer current is
    /// ignored.
    pub fn on_track_ended(&self, ended: &TrackId) {
        let is_current = self
            .state
            .current_track()
            .is_some_and(|current| &current.id == ended);
        if !is_current {
            debug!(track_id = %ended, "Ignoring end of a track that is not current");
            return;
        }

        // A finished track restarts from the beginning when played again
        *self.loaded.lock().unwrap_or_else(|e| e.into_inner()) = None;

        match self.queue.pop_next() {
            Some(next) => {
                info!(ended = %ended, next = %next.id, "Advancing to next queued track");
                self.play(next);
            }
            None => {
                let old_state = self.state.playback_state();
                self.state.update_playback(|s| s.is_playing = false);
                info!(track_id = %ended, "Queue exhausted");
                self.emit_state_change(old_state);
            }
        }
    }

    /// Fire-and-forget analytics; failures are only logged
    fn send_play_started(&self, play_id: Uuid, track_id: &TrackId) {
        if !self.analytics_enabled {
            return;
        }

        let event = PlayStartedEvent {
            play_id,
            track_id: track_id.clone(),
            user_id: self.state.current_user(),
            started_at: chrono::Utc::now(),
        };
        let beacon = self.api.post_play_started(event);
        let track_id = track_id.clone();
        tokio::spawn(async move {
            if let Err(e) = beacon.await {
                warn!(track_id = %track_id, "Play-started beacon failed: {}", e);
            }
        });
    }

    fn emit_state_change(&self, old_state: PlaybackState) {
        emit_state_change(&self.state, old_state);
    }
}

fn emit_state_change(state: &SharedState, old_state: PlaybackState) {
    let (new_state, track_id) =
        state.with_playback(|s| (s.playback_state(), s.current_track.as_ref().map(|t| t.id.clone())));
    if new_state == old_state {
        return;
    }

    debug!("Playback state changed: {} -> {}", old_state, new_state);
    state.broadcast_event(SessionEvent::PlaybackStateChanged {
        old_state,
        new_state,
        track_id,
        timestamp: chrono::Utc::now(),
    });
}
