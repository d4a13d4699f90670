//! Playback provenance ("Playing from: ...")

use std::sync::Arc;

use hymnal_common::events::{ContextKind, PlaybackContext, SessionEvent};
use tracing::debug;

use crate::state::SharedState;

/// Records which collection the current session was started from
#[derive(Clone)]
pub struct PlaybackContextTracker {
    state: Arc<SharedState>,
}

impl PlaybackContextTracker {
    pub fn new(state: Arc<SharedState>) -> Self {
        Self { state }
    }

    pub fn set_playback_context(&self, context: PlaybackContext) {
        let changed = self.state.update_playback(|s| {
            let changed = s.context != context;
            s.context = context.clone();
            changed
        });
        if !changed {
            return;
        }

        debug!(kind = %context.kind, id = ?context.id, "Playback context changed");
        self.state.broadcast_event(SessionEvent::ContextChanged {
            context,
            timestamp: chrono::Utc::now(),
        });
    }

    pub fn playback_context(&self) -> PlaybackContext {
        self.state.playback_context()
    }

    /// Label for the "Playing from" line, `None` without a context
    pub fn describe(&self) -> Option<String> {
        let context = self.playback_context();
        let label = match (context.kind, context.id.as_deref()) {
            (ContextKind::None, _) => return None,
            (ContextKind::Favorites, _) => "Favorites".to_string(),
            (ContextKind::Search, Some(query)) => format!("Search \"{}\"", query),
            (kind, Some(id)) => format!("{} {}", kind, id),
            (kind, None) => kind.to_string(),
        };
        Some(format!("Playing from: {}", label))
    }
}
