//! The opaque playback resource
//!
//! Whatever actually produces sound (an audio element, a native player) sits
//! behind [`PlaybackResource`]. Exactly one instance exists per session and it
//! is owned by `PlaybackEngine`; nothing else can reach it.

use futures::future::{self, BoxFuture, FutureExt};
use hymnal_common::Track;
use tracing::info;

use crate::error::Result;

/// Future resolving once the resource has actually started (or failed)
pub type ResourceFuture = BoxFuture<'static, Result<()>>;

/// Single audio output controlled by the playback engine
///
/// `start` replaces whatever is loaded. The load begins when `start` is
/// called; the returned future only reports the outcome.
pub trait PlaybackResource: Send + Sync {
    /// Load `track` from its audio URL and begin playing it
    fn start(&self, track: &Track) -> ResourceFuture;

    /// Continue the currently loaded track from where it was paused
    fn resume(&self) -> ResourceFuture;

    fn pause(&self);

    /// Stop and unload
    fn stop(&self);
}

/// Resource that plays nothing and always succeeds
///
/// Used by the CLI, which drives the session without an audio device.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentResource;

impl PlaybackResource for SilentResource {
    fn start(&self, track: &Track) -> ResourceFuture {
        info!(track_id = %track.id, url = %track.audio_url, "Silent resource: start");
        future::ready(Ok(())).boxed()
    }

    fn resume(&self) -> ResourceFuture {
        info!("Silent resource: resume");
        future::ready(Ok(())).boxed()
    }

    fn pause(&self) {
        info!("Silent resource: pause");
    }

    fn stop(&self) {
        info!("Silent resource: stop");
    }
}
