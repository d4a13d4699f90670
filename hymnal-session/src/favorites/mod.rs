//! Favorites: local mirror of the user's remote favorites with optimistic
//! mutations

mod cache;
mod entry;

pub use cache::{FavoritesSyncCache, LoadOutcome, ToggleOutcome};
pub use entry::FavoriteEntry;

use serde::{Deserialize, Serialize};

/// What a toggle does while the same track still has a mutation in flight
///
/// Neither policy ever issues a second network call concurrently with the
/// first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReentryPolicy {
    /// The toggle is absorbed; the in-flight intent stands
    #[default]
    Collapse,

    /// The toggle flips the desired end state; once the in-flight call
    /// settles, one follow-up call is made if the settled state differs
    Queue,
}

impl std::fmt::Display for ReentryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReentryPolicy::Collapse => write!(f, "collapse"),
            ReentryPolicy::Queue => write!(f, "queue"),
        }
    }
}
