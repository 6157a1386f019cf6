//! Upgrade errors

use crate::state::UpgradeState;
use std::path::PathBuf;
use stencil_provenance::ProvenanceError;
use stencil_template::{ContextError, MaterializeError, ResolveError};
use stencil_vcs::VcsError;

/// Illegal state machine step
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    /// `to` is not reachable from `from`
    #[error("illegal upgrade transition {from} -> {to}")]
    Illegal {
        /// Current state
        from: UpgradeState,
        /// Requested state
        to: UpgradeState,
    },
}

/// Errors aborting an upgrade
#[derive(Debug, thiserror::Error)]
pub enum UpgradeError {
    /// Target has no record and no template override was given
    #[error("{directory} was not generated from a template; pass a template explicitly")]
    NotGenerated {
        /// Upgrade target
        directory: PathBuf,
    },

    /// Target is not inside a repository with at least one commit
    #[error("{directory} is not under version control with at least one commit")]
    NoVersionControl {
        /// Upgrade target
        directory: PathBuf,
    },

    /// Regeneration produced a directory outside the isolated working copy
    #[error("template produced {actual}, expected {expected}")]
    UnexpectedProjectDir {
        /// Project directory inside the working copy
        expected: PathBuf,
        /// Directory the template actually produced
        actual: PathBuf,
    },

    /// Git command failed
    #[error(transparent)]
    Vcs(#[from] VcsError),

    /// Provenance records unreadable
    #[error(transparent)]
    Provenance(#[from] ProvenanceError),

    /// Template could not be resolved
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Context could not be rebuilt
    #[error(transparent)]
    Context(#[from] ContextError),

    /// Regeneration failed
    #[error(transparent)]
    Materialize(#[from] MaterializeError),

    /// Internal sequencing error
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// Filesystem error around the isolated working copy
    #[error("io error on {path}: {source}")]
    Io {
        /// File or directory being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

impl UpgradeError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// The failed git command, if a git command failed
    #[must_use]
    pub fn vcs(&self) -> Option<&VcsError> {
        match self {
            Self::Vcs(e) | Self::Resolve(ResolveError::Vcs(e)) => Some(e),
            _ => None,
        }
    }

    /// Process exit status: git's own status for git failures, else 1
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        self.vcs().map_or(1, VcsError::exit_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes() {
        let vcs = UpgradeError::from(VcsError::command_failed("git merge -q", 2, "conflict"));
        assert_eq!(vcs.exit_code(), 2);
        assert!(vcs.vcs().is_some());

        let nested = UpgradeError::from(ResolveError::Vcs(VcsError::command_failed("git checkout", 128, "")));
        assert_eq!(nested.exit_code(), 128);

        let other = UpgradeError::NoVersionControl {
            directory: PathBuf::from("/p"),
        };
        assert_eq!(other.exit_code(), 1);
        assert!(other.vcs().is_none());
    }
}
