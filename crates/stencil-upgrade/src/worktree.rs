//! Isolated working copy
//!
//! A secondary git worktree checked out on the template branch, living in a
//! container under the repository's metadata directory. The container is
//! removed and the worktree registration pruned when the guard is dropped.

use crate::error::UpgradeError;
use std::fs;
use std::path::{Path, PathBuf};
use stencil_vcs::{CommandRunner, Git};
use tracing::{debug, warn};

/// Scoped secondary worktree
#[derive(Debug)]
pub struct IsolatedWorkingCopy<'g, R: CommandRunner> {
    git: &'g Git<R>,
    repo_dir: PathBuf,
    container: PathBuf,
    worktree: PathBuf,
}

impl<'g, R: CommandRunner> IsolatedWorkingCopy<'g, R> {
    /// Attach `container/<name>` on `branch`
    ///
    /// A stale container from an interrupted run is removed first. With
    /// `no_checkout` the worktree starts with no files, which is what a
    /// full regeneration at the repository root wants.
    ///
    /// # Errors
    /// [`UpgradeError::Io`] when the stale container cannot be removed,
    /// [`UpgradeError::Vcs`] when git refuses the worktree. The container
    /// is cleaned up in both cases.
    pub fn attach(
        git: &'g Git<R>,
        repo_dir: &Path,
        container: PathBuf,
        name: &str,
        branch: &str,
        no_checkout: bool,
    ) -> Result<Self, UpgradeError> {
        if container.exists() {
            debug!(container = %container.display(), "removing stale working copy");
            fs::remove_dir_all(&container).map_err(|e| UpgradeError::io_error(&container, e))?;
            git.worktree_prune(repo_dir)?;
        }

        let guard = Self {
            git,
            repo_dir: repo_dir.to_path_buf(),
            worktree: container.join(name),
            container,
        };
        fs::create_dir_all(&guard.container).map_err(|e| UpgradeError::io_error(&guard.container, e))?;
        git.worktree_add(&guard.worktree, branch, no_checkout, repo_dir)?;
        Ok(guard)
    }

    /// Worktree root
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.worktree
    }

    /// Directory holding the worktree
    #[inline]
    #[must_use]
    pub fn container(&self) -> &Path {
        &self.container
    }

    fn release(&self) {
        if self.container.exists() {
            if let Err(error) = fs::remove_dir_all(&self.container) {
                warn!(container = %self.container.display(), %error, "failed to remove working copy");
            }
        }
        if let Err(error) = self.git.worktree_prune(&self.repo_dir) {
            warn!(%error, "failed to prune worktrees");
        }
    }
}

impl<R: CommandRunner> Drop for IsolatedWorkingCopy<'_, R> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stencil_test_utils::FakeRunner;
    use stencil_vcs::CommandOutput;

    #[test]
    fn drop_removes_container_and_prunes() {
        let repo = tempfile::tempdir().unwrap();
        let runner = FakeRunner::new();
        let git = Git::new(&runner);
        let container = repo.path().join(".git/stencil-template");

        {
            let copy = IsolatedWorkingCopy::attach(&git, repo.path(), container.clone(), "app", "stencil-template", true)
                .unwrap();
            assert_eq!(copy.path(), container.join("app"));
            assert!(copy.container().is_dir());
        }

        assert!(!container.exists());
        let commands = runner.commands();
        assert_eq!(commands.len(), 2);
        assert!(commands[0].starts_with("worktree add --no-checkout"));
        assert!(commands[0].ends_with("stencil-template"));
        assert_eq!(commands[1], "worktree prune");
    }

    #[test]
    fn stale_container_is_replaced() {
        let repo = tempfile::tempdir().unwrap();
        let runner = FakeRunner::new();
        let git = Git::new(&runner);
        let container = repo.path().join(".git/stencil-template");
        fs::create_dir_all(container.join("app/leftover")).unwrap();

        let copy = IsolatedWorkingCopy::attach(&git, repo.path(), container.clone(), "app", "b", false).unwrap();
        assert!(!container.join("app/leftover").exists());
        assert_eq!(runner.position(&["worktree", "prune"]), Some(0));
        drop(copy);
    }

    #[test]
    fn failed_attach_still_cleans_up() {
        let repo = tempfile::tempdir().unwrap();
        let runner = FakeRunner::new();
        runner.on(&["worktree", "add"], CommandOutput::exit(128).with_stderr("fatal: invalid reference"));
        let git = Git::new(&runner);
        let container = repo.path().join(".git/stencil-template");

        let err = IsolatedWorkingCopy::attach(&git, repo.path(), container.clone(), "app", "b", false).unwrap_err();
        assert_eq!(err.exit_code(), 128);
        assert!(!container.exists());
        assert!(runner.called_with(&["worktree", "prune"]));
    }
}
