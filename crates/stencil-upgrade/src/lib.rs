//! stencil Upgrade
//!
//! Re-applies a project's template through git so template changes merge
//! with the user's own edits:
//!
//! 1. the `stencil-template` branch holds successive pure template
//!    outputs, starting at the repository's root commit
//! 2. each upgrade regenerates the template with the recorded answers in an
//!    [`IsolatedWorkingCopy`] on that branch and commits the difference
//! 3. the branch is merged back, letting git do the three-way merge
//!
//! Progress is tracked by the [`UpgradeState`] machine.
//!
//! # Example
//!
//! ```rust,ignore
//! use stencil_upgrade::{UpgradeOrchestrator, UpgradeOutcome, UpgradeRequest};
//!
//! match UpgradeOrchestrator::new(&engine).upgrade(&UpgradeRequest::new("services/billing"))? {
//!     UpgradeOutcome::NoChanges => println!("No changes found"),
//!     UpgradeOutcome::Merged { .. } => {}
//!     UpgradeOutcome::Deferred { branch } => println!("merge {branch} by hand"),
//! }
//! ```

#![warn(unreachable_pub)]

mod error;
mod orchestrator;
mod state;
mod worktree;

pub use error::{TransitionError, UpgradeError};
pub use orchestrator::{
    UpgradeOrchestrator, UpgradeOutcome, UpgradeReport, UpgradeRequest, COMMIT_MESSAGE, DEFAULT_REMOTE,
    TEMPLATE_BRANCH,
};
pub use state::{allowed_transitions, validate_transition, StateTrail, UpgradeState};
pub use worktree::IsolatedWorkingCopy;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
