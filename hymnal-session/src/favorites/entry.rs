//! Cache entry types

use chrono::{DateTime, Utc};
use hymnal_common::events::FavoriteState;
use hymnal_common::TrackId;

/// One favorite as shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FavoriteEntry {
    pub track_id: TrackId,
    pub added_at: DateTime<Utc>,
    /// Whole days since `added_at`, as of the last recompute
    pub added_days_ago: i64,
    pub state: FavoriteState,
}

/// Remote call in flight for a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mutation {
    Add,
    Remove,
}

impl Mutation {
    pub(crate) fn toward(member: bool) -> Self {
        if member {
            Mutation::Add
        } else {
            Mutation::Remove
        }
    }

    /// Membership once the call succeeds
    pub(crate) fn target(self) -> bool {
        self == Mutation::Add
    }
}

impl std::fmt::Display for Mutation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mutation::Add => write!(f, "add"),
            Mutation::Remove => write!(f, "remove"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Pending {
    /// Only a completion carrying this sequence may reconcile the slot
    pub(crate) seq: u64,
    pub(crate) in_flight: Mutation,
    /// Membership the user asked for last
    pub(crate) desired: bool,
}

/// Per-track cache slot
///
/// A track without a slot is `Absent`. Slots exist for confirmed favorites
/// and for tracks with a pending mutation.
#[derive(Debug, Clone)]
pub(crate) struct Slot {
    pub(crate) added_at: DateTime<Utc>,
    pub(crate) added_days_ago: i64,
    /// Last membership confirmed by the server
    pub(crate) settled: bool,
    pub(crate) pending: Option<Pending>,
}

impl Slot {
    pub(crate) fn confirmed(added_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Self {
            added_at,
            added_days_ago: hymnal_common::time::days_between(added_at, now),
            settled: true,
            pending: None,
        }
    }

    pub(crate) fn state(&self) -> FavoriteState {
        match (self.pending, self.settled) {
            (Some(p), _) if p.desired => FavoriteState::OptimisticAdding,
            (Some(_), _) => FavoriteState::OptimisticRemoving,
            (None, true) => FavoriteState::Present,
            (None, false) => FavoriteState::Absent,
        }
    }

    pub(crate) fn entry(&self, track_id: &TrackId) -> FavoriteEntry {
        FavoriteEntry {
            track_id: track_id.clone(),
            added_at: self.added_at,
            added_days_ago: self.added_days_ago,
            state: self.state(),
        }
    }
}
