//! Upcoming-track queue
//!
//! The queue is the ordered list of tracks to play after the current one. It
//! lives in [`SharedState`]; this manager is the only writer. Order is strict
//! FIFO and duplicates are allowed.

use std::sync::Arc;

use hymnal_common::events::{QueueChangeTrigger, SessionEvent};
use hymnal_common::{Track, TrackId};
use tracing::{debug, info};

use crate::state::SharedState;

/// Queue operations over the shared playback session
#[derive(Clone)]
pub struct QueueManager {
    state: Arc<SharedState>,
}

impl QueueManager {
    pub fn new(state: Arc<SharedState>) -> Self {
        Self { state }
    }

    /// Empty the queue
    pub fn clear_queue(&self) {
        let removed = self.state.update_playback(|s| std::mem::take(&mut s.queue).len());
        debug!(removed, "Queue cleared");
        self.notify_changed(QueueChangeTrigger::Cleared);
    }

    /// Append `track` to the tail
    ///
    /// Returns `false` when the track is refused: enqueueing the current track
    /// onto an empty queue would make it the head, which the queue never
    /// allows.
    pub fn add_to_queue(&self, track: Track) -> bool {
        let track_id = track.id.clone();
        let accepted = self.state.update_playback(|s| {
            let refused = s.queue.is_empty()
                && s.current_track
                    .as_ref()
                    .is_some_and(|current| current.same_track(&track));
            if !refused {
                s.queue.push(track);
            }
            !refused
        });

        if accepted {
            debug!(track_id = %track_id, "Track enqueued");
            self.notify_changed(QueueChangeTrigger::UserEnqueue);
        } else {
            debug!(track_id = %track_id, "Refusing to enqueue the current track as queue head");
        }
        accepted
    }

    /// Replace the queue with up to `lookahead` tracks following `anchor` in
    /// `source`
    ///
    /// An anchor missing from `source` leaves an empty queue. Returns the new
    /// queue length.
    pub fn build_queue_from(&self, source: &[Track], anchor: &TrackId, lookahead: usize) -> usize {
        let upcoming: Vec<Track> = match source.iter().position(|t| &t.id == anchor) {
            Some(index) => source
                .iter()
                .skip(index + 1)
                .take(lookahead)
                .cloned()
                .collect(),
            None => {
                debug!(anchor = %anchor, "Anchor not in source list, queue left empty");
                Vec::new()
            }
        };

        let len = self.state.replace_queue(upcoming);

        info!(anchor = %anchor, len, "Queue rebuilt");
        self.notify_changed(QueueChangeTrigger::Rebuilt);
        len
    }

    /// Upcoming tracks, head first
    pub fn snapshot(&self) -> Vec<Track> {
        self.state.queue()
    }

    pub fn len(&self) -> usize {
        self.state.with_playback(|s| s.queue.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove and return the head
    pub(crate) fn pop_next(&self) -> Option<Track> {
        let next = self.state.update_playback(|s| {
            if s.queue.is_empty() {
                None
            } else {
                Some(s.queue.remove(0))
            }
        });
        if next.is_some() {
            self.notify_changed(QueueChangeTrigger::Advanced);
        }
        next
    }

    pub(crate) fn notify_changed(&self, trigger: QueueChangeTrigger) {
        let queue = self
            .state
            .with_playback(|s| s.queue.iter().map(|t| t.id.clone()).collect());
        self.state.broadcast_event(SessionEvent::QueueChanged {
            queue,
            trigger,
            timestamp: chrono::Utc::now(),
        });
    }
}
