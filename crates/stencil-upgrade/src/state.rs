//! Upgrade state machine
//!
//! ```text
//! NoRepo → BranchReady → WorktreeAttached → Regenerated → Staged ─┬→ NoChanges
//!                                                                  └→ Committed ─┬→ Merged
//!                                                                                └→ Deferred
//! ```
//!
//! Every state except `Cleaned` may move to `Cleaned`, which is terminal.

use crate::error::TransitionError;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

/// Upgrade progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpgradeState {
    /// Nothing done yet
    NoRepo,
    /// Template branch exists locally
    BranchReady,
    /// Isolated working copy attached on the template branch
    WorktreeAttached,
    /// Template re-expanded into the working copy
    Regenerated,
    /// Changes staged
    Staged,
    /// Regeneration matches the template branch tip
    NoChanges,
    /// Template branch advanced by one commit
    Committed,
    /// Template branch merged into the target
    Merged,
    /// Merge left to the user
    Deferred,
    /// Working copy removed
    Cleaned,
}

impl fmt::Display for UpgradeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NoRepo => "NO_REPO",
            Self::BranchReady => "BRANCH_READY",
            Self::WorktreeAttached => "WORKTREE_ATTACHED",
            Self::Regenerated => "REGENERATED",
            Self::Staged => "STAGED",
            Self::NoChanges => "NO_CHANGES",
            Self::Committed => "COMMITTED",
            Self::Merged => "MERGED",
            Self::Deferred => "DEFERRED",
            Self::Cleaned => "CLEANED",
        };
        f.write_str(name)
    }
}

/// Validate a state transition
///
/// # Errors
/// [`TransitionError::Illegal`] when `to` is not reachable from `from`.
pub fn validate_transition(from: UpgradeState, to: UpgradeState) -> Result<(), TransitionError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(TransitionError::Illegal { from, to })
    }
}

/// States reachable from `from` in one step
#[must_use]
pub fn allowed_transitions(from: UpgradeState) -> Vec<UpgradeState> {
    use UpgradeState::{
        BranchReady, Cleaned, Committed, Deferred, Merged, NoChanges, NoRepo, Regenerated, Staged,
        WorktreeAttached,
    };
    match from {
        NoRepo => vec![BranchReady, Cleaned],
        BranchReady => vec![WorktreeAttached, Cleaned],
        WorktreeAttached => vec![Regenerated, Cleaned],
        Regenerated => vec![Staged, Cleaned],
        Staged => vec![NoChanges, Committed, Cleaned],
        Committed => vec![Merged, Deferred, Cleaned],
        NoChanges | Merged | Deferred => vec![Cleaned],
        Cleaned => vec![],
    }
}

/// Current state plus the states visited so far
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateTrail {
    current: UpgradeState,
    visited: Vec<UpgradeState>,
}

impl Default for StateTrail {
    fn default() -> Self {
        Self {
            current: UpgradeState::NoRepo,
            visited: vec![UpgradeState::NoRepo],
        }
    }
}

impl StateTrail {
    /// Start at [`UpgradeState::NoRepo`]
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state
    #[inline]
    #[must_use]
    pub fn current(&self) -> UpgradeState {
        self.current
    }

    /// Every state visited, in order
    #[inline]
    #[must_use]
    pub fn visited(&self) -> &[UpgradeState] {
        &self.visited
    }

    /// Move to `to`
    ///
    /// # Errors
    /// [`TransitionError::Illegal`] for a transition the machine forbids.
    pub fn advance(&mut self, to: UpgradeState) -> Result<(), TransitionError> {
        validate_transition(self.current, to)?;
        info!(from = %self.current, to = %to, "upgrade state");
        self.current = to;
        self.visited.push(to);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use UpgradeState::*;

    const ALL: [UpgradeState; 10] = [
        NoRepo,
        BranchReady,
        WorktreeAttached,
        Regenerated,
        Staged,
        NoChanges,
        Committed,
        Merged,
        Deferred,
        Cleaned,
    ];

    #[test]
    fn every_state_can_be_cleaned() {
        for state in ALL.into_iter().filter(|s| *s != Cleaned) {
            assert!(validate_transition(state, Cleaned).is_ok(), "{state} cannot clean up");
        }
        assert!(allowed_transitions(Cleaned).is_empty());
    }

    #[test]
    fn happy_path_is_valid() {
        let mut trail = StateTrail::new();
        for state in [BranchReady, WorktreeAttached, Regenerated, Staged, Committed, Merged, Cleaned] {
            trail.advance(state).unwrap();
        }
        assert_eq!(trail.current(), Cleaned);
        assert_eq!(trail.visited().len(), 8);
    }

    #[test]
    fn illegal_transitions_are_rejected() {
        assert!(validate_transition(NoRepo, Committed).is_err());
        assert!(validate_transition(NoChanges, Merged).is_err());
        assert!(validate_transition(Staged, Merged).is_err());

        let mut trail = StateTrail::new();
        let err = trail.advance(Staged).unwrap_err();
        assert_eq!(err, TransitionError::Illegal { from: NoRepo, to: Staged });
        assert_eq!(trail.current(), NoRepo);
    }

    #[test]
    fn display_names() {
        assert_eq!(WorktreeAttached.to_string(), "WORKTREE_ATTACHED");
        assert_eq!(NoChanges.to_string(), "NO_CHANGES");
    }
}
