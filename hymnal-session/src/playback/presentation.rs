//! Full-screen player presentation
//!
//! Whether the full-screen player is open is a UI flag, independent of
//! playback: closing the view never stops audio and stopping audio never
//! closes the view.
//!
//! After a play action the session may ask for the view to open on its own
//! ([`AutoOpenPolicy`]). The open happens after a settle delay and is
//! cancelled by any explicit open/close in the meantime.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hymnal_common::events::SessionEvent;
use tracing::debug;

use crate::state::SharedState;

type ViewportPredicate = Arc<dyn Fn() -> bool + Send + Sync>;

/// When to open the full-screen player automatically after a play action
#[derive(Clone)]
pub struct AutoOpenPolicy {
    enabled: bool,
    delay: Duration,
    predicate: Option<ViewportPredicate>,
}

impl AutoOpenPolicy {
    /// Never auto-open
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            delay: Duration::ZERO,
            predicate: None,
        }
    }

    /// Auto-open after `delay` on every play action
    pub fn always(delay: Duration) -> Self {
        Self {
            enabled: true,
            delay,
            predicate: None,
        }
    }

    /// Auto-open after `delay` when `predicate` holds at play time
    ///
    /// The predicate typically inspects the viewport (e.g. "narrow screen").
    pub fn when<F>(delay: Duration, predicate: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        Self {
            enabled: true,
            delay,
            predicate: Some(Arc::new(predicate)),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn should_open(&self) -> bool {
        self.enabled && self.predicate.as_ref().map_or(true, |p| p())
    }
}

impl Default for AutoOpenPolicy {
    fn default() -> Self {
        Self::disabled()
    }
}

impl fmt::Debug for AutoOpenPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutoOpenPolicy")
            .field("enabled", &self.enabled)
            .field("delay", &self.delay)
            .field("has_predicate", &self.predicate.is_some())
            .finish()
    }
}

/// Opens and closes the full-screen player
#[derive(Clone)]
pub struct PresentationController {
    state: Arc<SharedState>,
    policy: AutoOpenPolicy,
    /// Bumped by every explicit open/close and every auto-open request; a
    /// pending auto-open only fires if it still holds the latest value
    intent_generation: Arc<AtomicU64>,
}

impl PresentationController {
    pub fn new(state: Arc<SharedState>, policy: AutoOpenPolicy) -> Self {
        Self {
            state,
            policy,
            intent_generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn policy(&self) -> &AutoOpenPolicy {
        &self.policy
    }

    pub fn is_open(&self) -> bool {
        self.state.is_full_screen_open()
    }

    pub fn open_full_screen(&self) {
        self.intent_generation.fetch_add(1, Ordering::SeqCst);
        set_open(&self.state, true);
    }

    pub fn close_full_screen(&self) {
        self.intent_generation.fetch_add(1, Ordering::SeqCst);
        set_open(&self.state, false);
    }

    /// Consult the policy after a play action
    ///
    /// Returns `true` if a delayed open was scheduled. Must be called from
    /// within a tokio runtime.
    pub fn request_auto_open(&self) -> bool {
        if !self.policy.should_open() || self.is_open() {
            return false;
        }

        let generation = self.intent_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let intent = self.intent_generation.clone();
        let state = self.state.clone();
        let delay = self.policy.delay();

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if intent.load(Ordering::SeqCst) != generation {
                debug!("Auto-open superseded by a later request");
                return;
            }
            set_open(&state, true);
        });
        true
    }
}

fn set_open(state: &SharedState, open: bool) {
    let changed = state.update_playback(|s| std::mem::replace(&mut s.full_screen_open, open) != open);
    if changed {
        debug!(open, "Full-screen player toggled");
        state.broadcast_event(SessionEvent::FullScreenChanged {
            open,
            timestamp: chrono::Utc::now(),
        });
    }
}
