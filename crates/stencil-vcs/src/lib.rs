//! stencil VCS plumbing
//!
//! Every version-control operation stencil performs is a blocking external
//! process invocation. This crate isolates that boundary:
//!
//! - [`CommandRunner`]: the single `run(program, args, cwd)` capability,
//!   injected wherever a subprocess is needed
//! - [`ProcessRunner`]: the real implementation on top of `std::process`
//! - [`Git`]: typed git operations (branching, worktrees, staging, merge)
//!   whose only success signal is the exit status
//!
//! # Example
//!
//! ```rust,ignore
//! use stencil_vcs::{Git, ProcessRunner};
//!
//! let git = Git::new(ProcessRunner::new());
//! if git.has_head(project_dir)? {
//!     let root = git.root_commit(project_dir)?;
//!     git.create_branch("stencil-template", &root, project_dir)?;
//! }
//! ```

#![warn(unreachable_pub)]

mod error;
mod git;
mod runner;

pub use error::VcsError;
pub use git::Git;
pub use runner::{CommandOutput, CommandRunner, ProcessRunner};

#[cfg(test)]
pub use runner::MockCommandRunner;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
