//! Queue and favorites type definitions
//!
//! Supporting types for queue changes and favorite membership.

use serde::{Deserialize, Serialize};

/// Why the queue changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum QueueChangeTrigger {
    /// Rebuilt from a source collection around a newly started track
    Rebuilt,
    UserEnqueue,
    Cleared,
    /// Head consumed by auto-advance
    Advanced,
}

impl std::fmt::Display for QueueChangeTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueueChangeTrigger::Rebuilt => write!(f, "Rebuilt"),
            QueueChangeTrigger::UserEnqueue => write!(f, "UserEnqueue"),
            QueueChangeTrigger::Cleared => write!(f, "Cleared"),
            QueueChangeTrigger::Advanced => write!(f, "Advanced"),
        }
    }
}

/// Favorite membership of one track for the current user
///
/// The optimistic states exist only while a remote add/remove is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum FavoriteState {
    Absent,
    OptimisticAdding,
    Present,
    OptimisticRemoving,
}

impl FavoriteState {
    /// Membership as shown to the user (optimistic states count as their target)
    pub fn is_member(self) -> bool {
        matches!(self, FavoriteState::Present | FavoriteState::OptimisticAdding)
    }

    pub fn is_pending(self) -> bool {
        matches!(
            self,
            FavoriteState::OptimisticAdding | FavoriteState::OptimisticRemoving
        )
    }
}

impl std::fmt::Display for FavoriteState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FavoriteState::Absent => write!(f, "Absent"),
            FavoriteState::OptimisticAdding => write!(f, "OptimisticAdding"),
            FavoriteState::Present => write!(f, "Present"),
            FavoriteState::OptimisticRemoving => write!(f, "OptimisticRemoving"),
        }
    }
}
