//! Scripted RemoteApi
//!
//! Each operation has a FIFO of scripted replies. An empty script answers
//! with a default success. Gated replies let a test decide when (and how) a
//! request completes, which is how completion order is controlled.

use std::collections::VecDeque;
use std::sync::Mutex;

use futures::future::{self, FutureExt};
use hymnal_common::model::PlayStartedEvent;
use hymnal_common::{FavoriteRecord, HomeFeed, Track, TrackId, UserId};
use hymnal_session::api::{ApiFuture, RemoteApi};
use hymnal_session::{Error, Result};
use tokio::sync::oneshot;

/// One recorded request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    FetchTracks,
    FetchFavorites(UserId),
    AddFavorite(UserId, TrackId),
    RemoveFavorite(UserId, TrackId),
    PlayStarted(TrackId),
    FetchHomeFeed,
}

/// Scripted reply for one request
pub enum Reply<T> {
    /// Complete immediately
    Now(Result<T>),
    /// Complete when the paired sender fires (a dropped sender is a network error)
    Gate(oneshot::Receiver<Result<T>>),
    /// Never complete
    Never,
}

impl<T> Reply<T> {
    pub fn ok(value: T) -> Self {
        Reply::Now(Ok(value))
    }

    pub fn network_error() -> Self {
        Reply::Now(Err(Error::Network("connection refused".to_string())))
    }
}

/// Gated reply plus the sender that completes it
pub fn gate<T>() -> (oneshot::Sender<Result<T>>, Reply<T>) {
    let (tx, rx) = oneshot::channel();
    (tx, Reply::Gate(rx))
}

type Script<T> = Mutex<VecDeque<Reply<T>>>;

#[derive(Default)]
pub struct FakeApi {
    calls: Mutex<Vec<ApiCall>>,
    catalog: Mutex<Vec<Track>>,
    tracks: Script<Vec<Track>>,
    favorites: Script<Vec<FavoriteRecord>>,
    adds: Script<()>,
    removes: Script<()>,
    plays: Script<()>,
    feeds: Script<HomeFeed>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalog(catalog: Vec<Track>) -> Self {
        let api = Self::new();
        *api.catalog.lock().unwrap() = catalog;
        api
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Favorite add/remove calls only, in issue order
    pub fn favorite_mutations(&self) -> Vec<ApiCall> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, ApiCall::AddFavorite(..) | ApiCall::RemoveFavorite(..)))
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&ApiCall) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }

    pub fn script_tracks(&self, reply: Reply<Vec<Track>>) {
        self.tracks.lock().unwrap().push_back(reply);
    }

    pub fn script_favorites(&self, reply: Reply<Vec<FavoriteRecord>>) {
        self.favorites.lock().unwrap().push_back(reply);
    }

    pub fn script_add(&self, reply: Reply<()>) {
        self.adds.lock().unwrap().push_back(reply);
    }

    pub fn script_remove(&self, reply: Reply<()>) {
        self.removes.lock().unwrap().push_back(reply);
    }

    pub fn script_play_started(&self, reply: Reply<()>) {
        self.plays.lock().unwrap().push_back(reply);
    }

    pub fn script_feed(&self, reply: Reply<HomeFeed>) {
        self.feeds.lock().unwrap().push_back(reply);
    }

    fn record(&self, call: ApiCall) {
        self.calls.lock().unwrap().push(call);
    }
}

fn respond<T: Send + 'static>(script: &Script<T>, default: impl FnOnce() -> T) -> ApiFuture<T> {
    match script.lock().unwrap().pop_front() {
        Some(Reply::Now(result)) => future::ready(result).boxed(),
        Some(Reply::Gate(rx)) => async move {
            rx.await
                .unwrap_or_else(|_| Err(Error::Network("gate dropped".to_string())))
        }
        .boxed(),
        Some(Reply::Never) => future::pending().boxed(),
        None => future::ready(Ok(default())).boxed(),
    }
}

impl RemoteApi for FakeApi {
    fn fetch_tracks(&self) -> ApiFuture<Vec<Track>> {
        self.record(ApiCall::FetchTracks);
        let catalog = self.catalog.lock().unwrap().clone();
        respond(&self.tracks, move || catalog)
    }

    fn fetch_favorites(&self, user: &UserId) -> ApiFuture<Vec<FavoriteRecord>> {
        self.record(ApiCall::FetchFavorites(user.clone()));
        respond(&self.favorites, Vec::new)
    }

    fn add_favorite(&self, user: &UserId, track: &TrackId) -> ApiFuture<()> {
        self.record(ApiCall::AddFavorite(user.clone(), track.clone()));
        respond(&self.adds, || ())
    }

    fn remove_favorite(&self, user: &UserId, track: &TrackId) -> ApiFuture<()> {
        self.record(ApiCall::RemoveFavorite(user.clone(), track.clone()));
        respond(&self.removes, || ())
    }

    fn post_play_started(&self, event: PlayStartedEvent) -> ApiFuture<()> {
        self.record(ApiCall::PlayStarted(event.track_id));
        respond(&self.plays, || ())
    }

    fn fetch_home_feed(&self) -> ApiFuture<HomeFeed> {
        self.record(ApiCall::FetchHomeFeed);
        respond(&self.feeds, HomeFeed::default)
    }
}
