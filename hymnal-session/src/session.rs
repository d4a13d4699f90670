//! Session root
//!
//! [`Session`] composes the shared state and every component, and is the one
//! object UI code holds (behind an `Arc`). Pages never talk to each other:
//! they call into the session and observe its state and events.

use std::sync::Arc;

use hymnal_common::events::{PlaybackContext, SessionEvent};
use hymnal_common::time::{Clock, SystemClock};
use hymnal_common::{HomeFeed, Track, TrackId, UserId};
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::api::RemoteApi;
use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::favorites::{FavoriteEntry, FavoritesSyncCache, LoadOutcome, ToggleOutcome};
use crate::feed::HomeFeedLoader;
use crate::playback::{
    AutoOpenPolicy, PlaybackContextTracker, PlaybackEngine, PlaybackResource, PresentationController,
    QueueManager,
};
use crate::state::{Notice, PlaybackSnapshot, SharedState};
use crate::storage::{LocalStore, USER_KEY};

/// Process-wide playback and favorites session
pub struct Session {
    config: SessionConfig,
    state: Arc<SharedState>,
    api: Arc<dyn RemoteApi>,
    store: Arc<dyn LocalStore>,
    engine: PlaybackEngine,
    queue: QueueManager,
    context: PlaybackContextTracker,
    presentation: PresentationController,
    favorites: FavoritesSyncCache,
    feed: HomeFeedLoader,
}

impl Session {
    /// Build a session on the system clock
    ///
    /// A user remembered in `store` is restored as the current user; call
    /// [`Session::refresh_favorites`] to load their favorites.
    pub fn new(
        config: SessionConfig,
        api: Arc<dyn RemoteApi>,
        resource: Box<dyn PlaybackResource>,
        store: Arc<dyn LocalStore>,
    ) -> Self {
        Self::with_clock(config, api, resource, store, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: SessionConfig,
        api: Arc<dyn RemoteApi>,
        resource: Box<dyn PlaybackResource>,
        store: Arc<dyn LocalStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let state = Arc::new(SharedState::new());
        let queue = QueueManager::new(state.clone());
        let engine = PlaybackEngine::new(
            state.clone(),
            resource,
            api.clone(),
            queue.clone(),
            config.playback.analytics_enabled,
        );
        let context = PlaybackContextTracker::new(state.clone());

        let policy = if config.presentation.auto_open_full_screen {
            AutoOpenPolicy::always(config.auto_open_delay())
        } else {
            AutoOpenPolicy::disabled()
        };
        let presentation = PresentationController::new(state.clone(), policy);

        let favorites = FavoritesSyncCache::new(
            state.clone(),
            api.clone(),
            clock,
            config.favorites.reentry_policy,
        );
        let feed = HomeFeedLoader::new(api.clone(), state.clone(), config.feed_timeout());

        match store.get(USER_KEY) {
            Ok(Some(user)) if !user.trim().is_empty() => {
                info!(user = %user, "Restored remembered user");
                state.set_current_user(Some(UserId::new(user)));
            }
            Ok(_) => {}
            Err(e) => warn!("Could not read remembered user: {}", e),
        }

        Self {
            config,
            state,
            api,
            store,
            engine,
            queue,
            context,
            presentation,
            favorites,
            feed,
        }
    }

    /// Replace the auto-open policy (e.g. with a viewport predicate)
    pub fn with_auto_open_policy(mut self, policy: AutoOpenPolicy) -> Self {
        self.presentation = PresentationController::new(self.state.clone(), policy);
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> &Arc<SharedState> {
        &self.state
    }

    pub fn engine(&self) -> &PlaybackEngine {
        &self.engine
    }

    pub fn queue(&self) -> &QueueManager {
        &self.queue
    }

    pub fn context(&self) -> &PlaybackContextTracker {
        &self.context
    }

    pub fn presentation(&self) -> &PresentationController {
        &self.presentation
    }

    pub fn favorites_cache(&self) -> &FavoritesSyncCache {
        &self.favorites
    }

    pub fn feed(&self) -> &HomeFeedLoader {
        &self.feed
    }

    // ------------------------------------------------------------------
    // Auth
    // ------------------------------------------------------------------

    pub fn current_user(&self) -> Option<UserId> {
        self.state.current_user()
    }

    /// Become `user`, remember them, and load their favorites
    pub async fn login(&self, user: UserId) -> LoadOutcome {
        info!(user = %user, "Logging in");
        if let Err(e) = self.store.set(USER_KEY, user.as_str()) {
            warn!(user = %user, "Could not remember user: {}", e);
        }
        self.state.set_current_user(Some(user.clone()));
        self.favorites.load_favorites(&user).await
    }

    /// Reset playback, presentation and favorites, and forget the user
    pub fn logout(&self) {
        info!("Logging out");
        self.engine.stop();
        self.queue.clear_queue();
        self.context.set_playback_context(PlaybackContext::none());
        self.presentation.close_full_screen();
        self.favorites.clear();
        self.state.set_current_user(None);
        if let Err(e) = self.store.remove(USER_KEY) {
            warn!("Could not forget user: {}", e);
        }
    }

    /// Reload the current user's favorites
    pub async fn refresh_favorites(&self) -> Result<LoadOutcome> {
        let user = self.current_user().ok_or(Error::AuthRequired)?;
        Ok(self.favorites.load_favorites(&user).await)
    }

    // ------------------------------------------------------------------
    // Playback
    // ------------------------------------------------------------------

    /// Play `track`, auto-opening the full-screen player if the policy says so
    pub fn play(&self, track: Track) {
        self.engine.play(track);
        self.presentation.request_auto_open();
    }

    /// Start `track` from a collection: queue what follows it, play it, and
    /// record where it came from
    pub fn play_from_collection(&self, track: Track, source: &[Track], context: PlaybackContext) {
        self.queue
            .build_queue_from(source, &track.id, self.config.playback.queue_lookahead);
        self.engine.play(track);
        self.context.set_playback_context(context);
        self.presentation.request_auto_open();
    }

    pub fn pause(&self) {
        self.engine.pause();
    }

    /// Pause or play `track`; a play may auto-open the full-screen player
    pub fn toggle(&self, track: Track) {
        if self.engine.toggle(track) {
            self.presentation.request_auto_open();
        }
    }

    /// The playback resource reached the end of `track_id`
    pub fn track_ended(&self, track_id: &TrackId) {
        self.engine.on_track_ended(track_id);
    }

    pub fn add_to_queue(&self, track: Track) -> bool {
        self.queue.add_to_queue(track)
    }

    pub fn clear_queue(&self) {
        self.queue.clear_queue();
    }

    pub fn build_queue_from(&self, source: &[Track], anchor: &TrackId, lookahead: usize) -> usize {
        self.queue.build_queue_from(source, anchor, lookahead)
    }

    pub fn set_playback_context(&self, context: PlaybackContext) {
        self.context.set_playback_context(context);
    }

    pub fn open_full_screen(&self) {
        self.presentation.open_full_screen();
    }

    pub fn close_full_screen(&self) {
        self.presentation.close_full_screen();
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.state.snapshot()
    }

    // ------------------------------------------------------------------
    // Favorites
    // ------------------------------------------------------------------

    pub async fn load_favorites(&self, user: &UserId) -> LoadOutcome {
        self.favorites.load_favorites(user).await
    }

    pub fn toggle_favorite<F: FnOnce()>(&self, track_id: &TrackId, on_require_login: F) -> ToggleOutcome {
        self.favorites.toggle_favorite(track_id, on_require_login)
    }

    pub fn remove_favorite(&self, track_id: &TrackId, user: &UserId) -> bool {
        self.favorites.remove_favorite(track_id, user)
    }

    pub fn is_favorited(&self, track_id: &TrackId) -> bool {
        self.favorites.is_favorited(track_id)
    }

    pub fn favorites(&self) -> Vec<FavoriteEntry> {
        self.favorites.favorites()
    }

    pub fn update_favorites_days_ago(&self) {
        self.favorites.update_favorites_days_ago();
    }

    // ------------------------------------------------------------------
    // Catalog & feed
    // ------------------------------------------------------------------

    /// Full catalog, empty when the backend is unreachable
    pub async fn fetch_catalog(&self) -> Vec<Track> {
        match self.api.fetch_tracks().await {
            Ok(tracks) => tracks,
            Err(e) => {
                warn!("Failed to fetch catalog: {}", e);
                Vec::new()
            }
        }
    }

    pub async fn load_home_feed(&self) -> Option<HomeFeed> {
        self.feed.load().await
    }

    pub fn home_feed(&self) -> Option<HomeFeed> {
        self.feed.current()
    }

    // ------------------------------------------------------------------
    // Notices & events
    // ------------------------------------------------------------------

    pub fn notice(&self) -> Option<Notice> {
        self.state.notice()
    }

    pub fn dismiss_notice(&self) {
        self.state.dismiss_notice();
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.state.subscribe_events()
    }
}
