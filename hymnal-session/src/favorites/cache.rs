//! Favorites sync cache
//!
//! Local mirror of one user's favorites. Toggling updates the mirror at once
//! and reconciles with the server in a spawned task:
//!
//! ```text
//!   Absent --toggle--> OptimisticAdding --ok--> Present
//!      ^                     |                     |
//!      +-------fail----------+                   toggle
//!      |                                           v
//!      +----------ok------- OptimisticRemoving <---+
//!                                |
//!                              fail --> Present
//! ```
//!
//! Every issued call carries a sequence number. A completion is applied only
//! if the slot is still waiting for that sequence; anything else (a logout, a
//! user switch) makes it a reconciliation conflict and it is dropped.
//!
//! Loads carry a generation number and only the newest load may apply. A
//! slot with a mutation in flight survives a load untouched.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use hymnal_common::events::{FavoriteState, SessionEvent};
use hymnal_common::time::Clock;
use hymnal_common::{FavoriteRecord, TrackId, UserId};
use tracing::{debug, info, warn};

use super::entry::{FavoriteEntry, Mutation, Pending, Slot};
use super::ReentryPolicy;
use crate::api::RemoteApi;
use crate::error::{Error, Result};
use crate::state::SharedState;

/// Result of [`FavoritesSyncCache::load_favorites`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Remote list applied; `count` favorites now shown
    Applied { count: usize },
    /// Fetch failed; previous contents kept and marked stale
    Stale,
    /// A newer load (or logout) started first; result dropped
    Superseded,
}

/// Result of [`FavoritesSyncCache::toggle_favorite`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// No user; the login callback ran
    LoginRequired,
    /// Optimistic state applied and a remote call issued
    Started(FavoriteState),
    /// Absorbed by the in-flight mutation
    Collapsed,
    /// Desired end state updated; reconciled after the in-flight call
    Queued(FavoriteState),
}

#[derive(Debug, Default)]
struct CacheInner {
    owner: Option<UserId>,
    slots: HashMap<TrackId, Slot>,
    stale: bool,
    load_generation: u64,
    next_seq: u64,
}

impl CacheInner {
    fn state_of(&self, track_id: &TrackId) -> FavoriteState {
        self.slots
            .get(track_id)
            .map_or(FavoriteState::Absent, Slot::state)
    }

    fn member_count(&self) -> usize {
        self.slots.values().filter(|s| s.state().is_member()).count()
    }

    fn next_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    /// Point the cache at `user`, dropping another user's contents
    fn adopt_owner(&mut self, user: &UserId) {
        if self.owner.as_ref() != Some(user) {
            if let Some(previous) = &self.owner {
                debug!(previous = %previous, user = %user, "Favorites owner changed");
            }
            self.owner = Some(user.clone());
            self.slots.clear();
            self.stale = false;
        }
    }
}

/// A remote call to issue once the lock is released
struct Issue {
    user: UserId,
    track_id: TrackId,
    mutation: Mutation,
    seq: u64,
}

/// Optimistic favorites cache
///
/// Cheap to clone; clones share the same cache.
#[derive(Clone)]
pub struct FavoritesSyncCache {
    state: Arc<SharedState>,
    api: Arc<dyn RemoteApi>,
    clock: Arc<dyn Clock>,
    policy: ReentryPolicy,
    inner: Arc<Mutex<CacheInner>>,
}

impl FavoritesSyncCache {
    pub fn new(
        state: Arc<SharedState>,
        api: Arc<dyn RemoteApi>,
        clock: Arc<dyn Clock>,
        policy: ReentryPolicy,
    ) -> Self {
        Self {
            state,
            api,
            clock,
            policy,
            inner: Arc::new(Mutex::new(CacheInner::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn policy(&self) -> ReentryPolicy {
        self.policy
    }

    /// Replace the cache with the server's list for `user`
    ///
    /// Failures never propagate: the previous contents stay and are marked
    /// stale.
    pub async fn load_favorites(&self, user: &UserId) -> LoadOutcome {
        let generation = {
            let mut inner = self.lock();
            inner.adopt_owner(user);
            inner.load_generation += 1;
            inner.load_generation
        };
        debug!(user = %user, generation, "Loading favorites");

        let result = self.api.fetch_favorites(user).await;

        let (outcome, changed) = {
            let mut inner = self.lock();
            if inner.load_generation != generation || inner.owner.as_ref() != Some(user) {
                debug!(user = %user, generation, "Discarding superseded favorites load");
                return LoadOutcome::Superseded;
            }

            match result {
                Ok(records) => {
                    let changed = self.apply_records(&mut inner, records);
                    inner.stale = false;
                    let count = inner.member_count();
                    info!(user = %user, count, "Favorites loaded");
                    (LoadOutcome::Applied { count }, changed)
                }
                Err(e) => {
                    warn!(user = %user, "Failed to load favorites, keeping cached list: {}", e);
                    inner.stale = true;
                    (LoadOutcome::Stale, Vec::new())
                }
            }
        };

        for (track_id, state) in changed {
            self.emit_changed(track_id, state);
        }
        let count = match outcome {
            LoadOutcome::Applied { count } => count,
            _ => self.lock().member_count(),
        };
        self.state.broadcast_event(SessionEvent::FavoritesLoaded {
            user_id: user.clone(),
            count,
            stale: outcome == LoadOutcome::Stale,
            timestamp: chrono::Utc::now(),
        });
        outcome
    }

    /// Rebuild slots from the server list
    ///
    /// The server decides every slot's settled membership. A pending mutation
    /// moves onto the rebuilt slot, so a later rollback lands on what the
    /// server last reported. Returns the tracks whose visible state changed.
    fn apply_records(
        &self,
        inner: &mut CacheInner,
        records: Vec<FavoriteRecord>,
    ) -> Vec<(TrackId, FavoriteState)> {
        let now = self.clock.now();
        let mut slots: HashMap<TrackId, Slot> = records
            .into_iter()
            .map(|r| (r.track_id, Slot::confirmed(r.added_at, now)))
            .collect();

        for (track_id, slot) in inner.slots.iter() {
            let Some(pending) = slot.pending else {
                continue;
            };
            slots
                .entry(track_id.clone())
                .or_insert_with(|| Slot {
                    added_at: slot.added_at,
                    added_days_ago: slot.added_days_ago,
                    settled: false,
                    pending: None,
                })
                .pending = Some(pending);
        }

        let mut changed: Vec<(TrackId, FavoriteState)> = slots
            .iter()
            .filter(|(id, slot)| inner.state_of(id) != slot.state())
            .map(|(id, slot)| (id.clone(), slot.state()))
            .collect();
        changed.extend(
            inner
                .slots
                .keys()
                .filter(|id| !slots.contains_key(*id))
                .map(|id| (id.clone(), FavoriteState::Absent)),
        );

        inner.slots = slots;
        changed
    }

    /// Flip membership of `track_id` for the logged-in user
    ///
    /// Without a user `on_require_login` runs once and nothing changes.
    pub fn toggle_favorite<F>(&self, track_id: &TrackId, on_require_login: F) -> ToggleOutcome
    where
        F: FnOnce(),
    {
        let Some(user) = self.state.current_user() else {
            debug!(track_id = %track_id, "Favorite toggle requires login");
            on_require_login();
            return ToggleOutcome::LoginRequired;
        };

        let (outcome, issue) = {
            let mut inner = self.lock();
            inner.adopt_owner(&user);

            let (pending, member) = inner
                .slots
                .get(track_id)
                .map_or((None, false), |slot| (slot.pending, slot.settled));
            match pending {
                Some(_) if self.policy == ReentryPolicy::Collapse => {
                    debug!(track_id = %track_id, "Toggle absorbed by in-flight mutation");
                    return ToggleOutcome::Collapsed;
                }
                Some(_) => {
                    if let Some(pending) = inner.slots.get_mut(track_id).and_then(|s| s.pending.as_mut()) {
                        pending.desired = !pending.desired;
                    }
                    let state = inner.state_of(track_id);
                    debug!(track_id = %track_id, state = %state, "Toggle queued behind in-flight mutation");
                    (ToggleOutcome::Queued(state), None)
                }
                None => {
                    let issue = self.begin(&mut inner, &user, track_id, Mutation::toward(!member));
                    (ToggleOutcome::Started(inner.state_of(track_id)), Some(issue))
                }
            }
        };

        let state = self.favorite_state(track_id);
        self.emit_changed(track_id.clone(), state);
        if let Some(issue) = issue {
            self.spawn_mutation(issue);
        }
        outcome
    }

    /// Explicitly remove `track_id` from `user`'s favorites
    ///
    /// No-op when the track is not a favorite, is already being removed, or
    /// `user` does not own this cache. During a pending add the removal is
    /// recorded and issued once the add settles. Returns whether anything
    /// changed.
    pub fn remove_favorite(&self, track_id: &TrackId, user: &UserId) -> bool {
        let issue = {
            let mut inner = self.lock();
            if inner.owner.as_ref() != Some(user) {
                debug!(track_id = %track_id, user = %user, "Remove ignored for non-owner");
                return false;
            }

            let Some((pending, settled)) = inner
                .slots
                .get(track_id)
                .map(|slot| (slot.pending, slot.settled))
            else {
                return false;
            };
            match pending {
                Some(pending) if !pending.desired => return false,
                Some(_) => {
                    if let Some(pending) = inner.slots.get_mut(track_id).and_then(|s| s.pending.as_mut()) {
                        pending.desired = false;
                    }
                    debug!(track_id = %track_id, "Removal deferred until add settles");
                    None
                }
                None if !settled => return false,
                None => Some(self.begin(&mut inner, user, track_id, Mutation::Remove)),
            }
        };

        self.emit_changed(track_id.clone(), self.favorite_state(track_id));
        if let Some(issue) = issue {
            self.spawn_mutation(issue);
        }
        true
    }

    /// Mark a slot pending and describe the call to issue
    fn begin(&self, inner: &mut CacheInner, user: &UserId, track_id: &TrackId, mutation: Mutation) -> Issue {
        let seq = inner.next_seq();
        let now = self.clock.now();
        let slot = inner.slots.entry(track_id.clone()).or_insert_with(|| Slot {
            added_at: now,
            added_days_ago: 0,
            settled: false,
            pending: None,
        });
        slot.pending = Some(Pending {
            seq,
            in_flight: mutation,
            desired: mutation.target(),
        });
        debug!(track_id = %track_id, seq, op = %mutation, "Favorite mutation issued");

        Issue {
            user: user.clone(),
            track_id: track_id.clone(),
            mutation,
            seq,
        }
    }

    fn spawn_mutation(&self, issue: Issue) {
        let call = match issue.mutation {
            Mutation::Add => self.api.add_favorite(&issue.user, &issue.track_id),
            Mutation::Remove => self.api.remove_favorite(&issue.user, &issue.track_id),
        };
        let cache = self.clone();
        tokio::spawn(async move {
            let result = call.await;
            if let Err(e) = cache.complete(issue, result) {
                debug!("{}", e);
            }
        });
    }

    /// Reconcile a finished remote call
    fn complete(&self, issue: Issue, result: Result<()>) -> Result<()> {
        let Issue {
            user,
            track_id,
            mutation,
            seq,
        } = issue;

        let follow_up = {
            let mut inner = self.lock();
            if inner.owner.as_ref() != Some(&user) {
                return Err(Error::ReconciliationConflict(format!(
                    "{} of {} for {} finished after owner change",
                    mutation, track_id, user
                )));
            }
            let Some(pending) = inner
                .slots
                .get(&track_id)
                .and_then(|slot| slot.pending)
                .filter(|p| p.seq == seq && p.in_flight == mutation)
            else {
                return Err(Error::ReconciliationConflict(format!(
                    "{} of {} (seq {}) is no longer current",
                    mutation, track_id, seq
                )));
            };

            let succeeded = result.is_ok();
            let next = match result {
                Ok(()) if mutation.target() == pending.desired => {
                    debug!(track_id = %track_id, seq, op = %mutation, "Favorite mutation confirmed");
                    None
                }
                Ok(()) => Some(Mutation::toward(pending.desired)),
                Err(e) => {
                    warn!(track_id = %track_id, op = %mutation, "Favorite sync failed, rolling back: {}", e);
                    self.state.raise_notice("Could not update favorites. Please try again.");
                    None
                }
            };
            // On failure the slot returns to its last confirmed membership
            let settled = if succeeded {
                mutation.target()
            } else {
                inner.slots.get(&track_id).is_some_and(|s| s.settled)
            };

            let issue = match next {
                Some(next) => {
                    let seq = inner.next_seq();
                    debug!(track_id = %track_id, seq, op = %next, "Issuing follow-up mutation");
                    Some(Issue {
                        user,
                        track_id: track_id.clone(),
                        mutation: next,
                        seq,
                    })
                }
                None => None,
            };

            match (&issue, settled) {
                (Some(issue), _) => {
                    if let Some(slot) = inner.slots.get_mut(&track_id) {
                        slot.settled = settled;
                        slot.pending = Some(Pending {
                            seq: issue.seq,
                            in_flight: issue.mutation,
                            desired: pending.desired,
                        });
                    }
                }
                // Settled absent: the slot carries no information
                (None, false) => {
                    inner.slots.remove(&track_id);
                }
                (None, true) => {
                    if let Some(slot) = inner.slots.get_mut(&track_id) {
                        slot.settled = true;
                        slot.pending = None;
                    }
                }
            }
            issue
        };

        match follow_up {
            Some(issue) => self.spawn_mutation(issue),
            None => {
                let state = self.favorite_state(&track_id);
                self.emit_changed(track_id, state);
            }
        }
        Ok(())
    }

    pub fn favorite_state(&self, track_id: &TrackId) -> FavoriteState {
        self.lock().state_of(track_id)
    }

    /// Shown as a favorite (confirmed or being added)
    pub fn is_favorited(&self, track_id: &TrackId) -> bool {
        self.favorite_state(track_id).is_member()
    }

    /// Recompute every entry's age against the clock
    pub fn update_favorites_days_ago(&self) {
        let now = self.clock.now();
        let mut inner = self.lock();
        for slot in inner.slots.values_mut() {
            slot.added_days_ago = hymnal_common::time::days_between(slot.added_at, now);
        }
    }

    /// Current favorites, newest first
    pub fn favorites(&self) -> Vec<FavoriteEntry> {
        let inner = self.lock();
        let mut entries: Vec<FavoriteEntry> = inner
            .slots
            .iter()
            .filter(|(_, slot)| slot.state().is_member())
            .map(|(id, slot)| slot.entry(id))
            .collect();
        entries.sort_by(|a, b| {
            b.added_at
                .cmp(&a.added_at)
                .then_with(|| a.track_id.cmp(&b.track_id))
        });
        entries
    }

    pub fn entry(&self, track_id: &TrackId) -> Option<FavoriteEntry> {
        self.lock().slots.get(track_id).map(|slot| slot.entry(track_id))
    }

    /// Last load failed and the contents may be out of date
    pub fn is_stale(&self) -> bool {
        self.lock().stale
    }

    pub fn owner(&self) -> Option<UserId> {
        self.lock().owner.clone()
    }

    /// Forget everything (logout)
    ///
    /// In-flight loads and mutations are discarded when they finish.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.owner = None;
        inner.slots.clear();
        inner.stale = false;
        inner.load_generation += 1;
        debug!("Favorites cache cleared");
    }

    fn emit_changed(&self, track_id: TrackId, state: FavoriteState) {
        self.state.broadcast_event(SessionEvent::FavoriteChanged {
            track_id,
            state,
            timestamp: chrono::Utc::now(),
        });
    }
}
