//! Scripted PlaybackResource
//!
//! Clones share the same log and script, so a test keeps one clone and hands
//! the other to the session.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use futures::future::{self, FutureExt};
use hymnal_common::{Track, TrackId};
use hymnal_session::playback::{PlaybackResource, ResourceFuture};
use hymnal_session::{Error, Result};

use super::fake_api::Reply;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceCall {
    Start(TrackId),
    Resume,
    Pause,
    Stop,
}

#[derive(Default)]
struct Inner {
    calls: Vec<ResourceCall>,
    loaded: Option<TrackId>,
    starts: VecDeque<Reply<()>>,
}

#[derive(Clone, Default)]
pub struct FakeResource {
    inner: Arc<Mutex<Inner>>,
}

impl FakeResource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<ResourceCall> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn starts(&self) -> Vec<TrackId> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ResourceCall::Start(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    /// Track currently loaded (at most one at any time)
    pub fn loaded(&self) -> Option<TrackId> {
        self.inner.lock().unwrap().loaded.clone()
    }

    /// Script the outcome of the next `start` (default: success)
    pub fn script_start(&self, reply: Reply<()>) {
        self.inner.lock().unwrap().starts.push_back(reply);
    }

    pub fn fail_next_start(&self) {
        self.script_start(Reply::Now(Err(Error::MediaLoad("unsupported format".to_string()))));
    }
}

impl PlaybackResource for FakeResource {
    fn start(&self, track: &Track) -> ResourceFuture {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(ResourceCall::Start(track.id.clone()));
        inner.loaded = Some(track.id.clone());
        match inner.starts.pop_front() {
            Some(Reply::Now(result)) => future::ready(result).boxed(),
            Some(Reply::Gate(rx)) => async move {
                rx.await
                    .unwrap_or_else(|_| Err(Error::MediaLoad("gate dropped".to_string())))
            }
            .boxed(),
            Some(Reply::Never) => future::pending::<Result<()>>().boxed(),
            None => future::ready(Ok(())).boxed(),
        }
    }

    fn resume(&self) -> ResourceFuture {
        self.inner.lock().unwrap().calls.push(ResourceCall::Resume);
        future::ready(Ok(())).boxed()
    }

    fn pause(&self) {
        self.inner.lock().unwrap().calls.push(ResourceCall::Pause);
    }

    fn stop(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(ResourceCall::Stop);
        inner.loaded = None;
    }
}
