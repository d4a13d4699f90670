//! Home feed loading
//!
//! The home page shows one aggregated payload. Every load takes a new
//! generation number; when an older load finishes after a newer one started,
//! its result is dropped. The fetch is bounded by a hard timeout and any
//! failure yields [`HomeFeed::empty`] so the page always renders.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use hymnal_common::events::SessionEvent;
use hymnal_common::HomeFeed;
use tracing::{debug, info, warn};

use crate::api::RemoteApi;
use crate::error::Error;
use crate::state::SharedState;

/// Loads and holds the home feed
#[derive(Clone)]
pub struct HomeFeedLoader {
    api: Arc<dyn RemoteApi>,
    state: Arc<SharedState>,
    timeout: Duration,
    generation: Arc<AtomicU64>,
    current: Arc<RwLock<Option<HomeFeed>>>,
}

impl HomeFeedLoader {
    pub fn new(api: Arc<dyn RemoteApi>, state: Arc<SharedState>, timeout: Duration) -> Self {
        Self {
            api,
            state,
            timeout,
            generation: Arc::new(AtomicU64::new(0)),
            current: Arc::new(RwLock::new(None)),
        }
    }

    /// Fetch the feed
    ///
    /// Returns `None` when a newer load started meanwhile, otherwise the feed
    /// now current (possibly the empty fallback).
    pub async fn load(&self) -> Option<HomeFeed> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(generation, "Loading home feed");

        let feed = match tokio::time::timeout(self.timeout, self.api.fetch_home_feed()).await {
            Ok(Ok(feed)) => feed,
            Ok(Err(e)) => {
                warn!(generation, "Home feed failed, showing empty feed: {}", e);
                HomeFeed::empty()
            }
            Err(_) => {
                warn!(generation, "{}, showing empty feed", Error::Timeout(self.timeout));
                HomeFeed::empty()
            }
        };

        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(generation, "Discarding superseded home feed");
            return None;
        }

        info!(
            generation,
            recent = feed.recent.len(),
            popular = feed.popular.len(),
            fallback = feed.is_fallback,
            "Home feed updated"
        );
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = Some(feed.clone());
        self.state.broadcast_event(SessionEvent::HomeFeedUpdated {
            generation,
            fallback: feed.is_fallback,
            timestamp: chrono::Utc::now(),
        });
        Some(feed)
    }

    /// Last applied feed
    pub fn current(&self) -> Option<HomeFeed> {
        self.current.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}
