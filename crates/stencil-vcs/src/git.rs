//! Typed git operations
//!
//! Each method maps to one `git` invocation. Exit status is the only signal
//! inspected; output is read only for one-line revision and path queries
//! and for index listings.

use crate::error::VcsError;
use crate::runner::{CommandOutput, CommandRunner};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Git command wrapper over an injected [`CommandRunner`]
#[derive(Debug, Clone)]
pub struct Git<R> {
    runner: R,
    program: String,
}

impl<R: CommandRunner> Git<R> {
    /// Create wrapper invoking `git` from `PATH`
    #[inline]
    #[must_use]
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            program: "git".to_string(),
        }
    }

    /// Use a different git executable
    #[inline]
    #[must_use]
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Underlying runner
    #[inline]
    #[must_use]
    pub fn runner(&self) -> &R {
        &self.runner
    }

    fn render(&self, args: &[String]) -> String {
        let mut line = self.program.clone();
        for arg in args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }

    /// Run git and return its output whatever the exit status
    ///
    /// # Errors
    /// Returns [`VcsError::Spawn`] if the process could not be started.
    pub fn invoke(&self, args: &[String], cwd: &Path) -> Result<CommandOutput, VcsError> {
        debug!(cwd = %cwd.display(), "{}", self.render(args));
        self.runner
            .run(&self.program, args, cwd)
            .map_err(|source| VcsError::Spawn {
                command: self.render(args),
                source,
            })
    }

    /// Run git and fail on a non-zero exit status
    ///
    /// # Errors
    /// Returns [`VcsError::CommandFailed`] carrying the command line and
    /// status when git exits non-zero.
    pub fn check(&self, args: &[String], cwd: &Path) -> Result<CommandOutput, VcsError> {
        let output = self.invoke(args, cwd)?;
        if output.success() {
            Ok(output)
        } else {
            Err(VcsError::command_failed(
                self.render(args),
                output.code,
                output.stderr.trim(),
            ))
        }
    }

    fn single_line(&self, args: &[String], cwd: &Path) -> Result<String, VcsError> {
        let output = self.check(args, cwd)?;
        Ok(output.first_line().to_string())
    }

    /// Whether `reference` resolves to an object (`rev-parse -q --verify`)
    ///
    /// # Errors
    /// Only spawn failures are errors; an unknown reference is `Ok(false)`.
    pub fn verify_ref(&self, reference: &str, cwd: &Path) -> Result<bool, VcsError> {
        let output = self.invoke(&args(["rev-parse", "-q", "--verify", reference]), cwd)?;
        Ok(output.success())
    }

    /// Whether `cwd` is inside a repository with at least one commit
    ///
    /// # Errors
    /// Only spawn failures are errors.
    pub fn has_head(&self, cwd: &Path) -> Result<bool, VcsError> {
        self.verify_ref("HEAD", cwd)
    }

    /// The first parentless commit reachable from `HEAD`
    ///
    /// # Errors
    /// Fails when git fails or prints no revision.
    pub fn root_commit(&self, cwd: &Path) -> Result<String, VcsError> {
        let args = args(["rev-list", "--max-parents=0", "--max-count=1", "HEAD"]);
        let revision = self.single_line(&args, cwd)?;
        if revision.is_empty() {
            return Err(VcsError::UnexpectedOutput {
                command: self.render(&args),
                output: revision,
            });
        }
        Ok(revision)
    }

    /// Create `name` pointing at `start_point`
    ///
    /// # Errors
    /// Fails when git exits non-zero.
    pub fn create_branch(&self, name: &str, start_point: &str, cwd: &Path) -> Result<(), VcsError> {
        self.check(&args(["branch", name, start_point]), cwd)?;
        Ok(())
    }

    /// Absolute path of the working tree root
    ///
    /// # Errors
    /// Fails outside a working tree.
    pub fn toplevel(&self, cwd: &Path) -> Result<PathBuf, VcsError> {
        self.non_empty_path(&args(["rev-parse", "--show-toplevel"]), cwd)
    }

    /// Path of `cwd` relative to the working tree root, without slashes at
    /// either end; empty at the root
    ///
    /// # Errors
    /// Fails outside a working tree.
    pub fn show_prefix(&self, cwd: &Path) -> Result<String, VcsError> {
        let prefix = self.single_line(&args(["rev-parse", "--show-prefix"]), cwd)?;
        Ok(prefix.trim_matches('/').to_string())
    }

    /// Absolute path of the repository metadata directory
    ///
    /// # Errors
    /// Fails outside a repository.
    pub fn git_dir(&self, cwd: &Path) -> Result<PathBuf, VcsError> {
        self.non_empty_path(&args(["rev-parse", "--absolute-git-dir"]), cwd)
    }

    fn non_empty_path(&self, args: &[String], cwd: &Path) -> Result<PathBuf, VcsError> {
        let line = self.single_line(args, cwd)?;
        if line.is_empty() {
            return Err(VcsError::UnexpectedOutput {
                command: self.render(args),
                output: line,
            });
        }
        Ok(PathBuf::from(line))
    }

    /// Attach a secondary worktree at `path` checked out to `branch`
    ///
    /// # Errors
    /// Fails when git exits non-zero.
    pub fn worktree_add(
        &self,
        path: &Path,
        branch: &str,
        no_checkout: bool,
        cwd: &Path,
    ) -> Result<(), VcsError> {
        let mut argv = args(["worktree", "add"]);
        if no_checkout {
            argv.push("--no-checkout".to_string());
        }
        argv.push(path.to_string_lossy().into_owned());
        argv.push(branch.to_string());
        self.check(&argv, cwd)?;
        Ok(())
    }

    /// Drop registrations of worktrees whose directory is gone
    ///
    /// # Errors
    /// Fails when git exits non-zero.
    pub fn worktree_prune(&self, cwd: &Path) -> Result<(), VcsError> {
        self.check(&args(["worktree", "prune"]), cwd)?;
        Ok(())
    }

    /// Stage every change, addition and deletion under `cwd`
    ///
    /// # Errors
    /// Fails when git exits non-zero.
    pub fn add_all(&self, cwd: &Path) -> Result<(), VcsError> {
        self.check(&args(["add", "-A", "."]), cwd)?;
        Ok(())
    }

    /// Reset the index entries of `paths` to `HEAD`
    ///
    /// # Errors
    /// Fails when git exits non-zero.
    pub fn reset_paths(&self, paths: &[String], cwd: &Path) -> Result<(), VcsError> {
        let mut argv = args(["reset", "-q", "HEAD", "--"]);
        argv.extend(paths.iter().cloned());
        self.check(&argv, cwd)?;
        Ok(())
    }

    /// Index entries matching `paths` (`ls-files -z`)
    ///
    /// A pattern that matches nothing contributes no entries.
    ///
    /// # Errors
    /// Fails when git exits non-zero.
    pub fn tracked_paths(&self, paths: &[String], cwd: &Path) -> Result<Vec<String>, VcsError> {
        let mut argv = args(["ls-files", "-z", "--"]);
        argv.extend(paths.iter().cloned());
        let output = self.check(&argv, cwd)?;
        Ok(output
            .stdout
            .split('\0')
            .filter(|entry| !entry.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Restore `paths` in index and working tree from `HEAD`
    ///
    /// Every path must be known to `HEAD`; an empty list runs nothing.
    ///
    /// # Errors
    /// Fails when git exits non-zero.
    pub fn checkout_head_paths(&self, paths: &[String], cwd: &Path) -> Result<(), VcsError> {
        if paths.is_empty() {
            return Ok(());
        }
        let mut argv = args(["checkout", "HEAD", "--"]);
        argv.extend(paths.iter().cloned());
        self.check(&argv, cwd)?;
        Ok(())
    }

    /// Delete untracked files and directories matching `paths`
    ///
    /// # Errors
    /// Fails when git exits non-zero.
    pub fn clean_paths(&self, paths: &[String], cwd: &Path) -> Result<(), VcsError> {
        let mut argv = args(["clean", "-fdq", "--"]);
        argv.extend(paths.iter().cloned());
        self.check(&argv, cwd)?;
        Ok(())
    }

    /// Whether the index differs from `HEAD` (`diff-index --quiet`)
    ///
    /// # Errors
    /// Status 0 and 1 are answers; anything else is a failure.
    pub fn has_staged_changes(&self, cwd: &Path) -> Result<bool, VcsError> {
        let argv = args(["diff-index", "--quiet", "HEAD", "--"]);
        let output = self.invoke(&argv, cwd)?;
        match output.code {
            0 => Ok(false),
            1 => Ok(true),
            code => Err(VcsError::command_failed(
                self.render(&argv),
                code,
                output.stderr.trim(),
            )),
        }
    }

    /// Commit the index, skipping hooks
    ///
    /// # Errors
    /// Fails when git exits non-zero.
    pub fn commit(&self, message: &str, cwd: &Path) -> Result<(), VcsError> {
        self.check(&args(["commit", "-q", "-n", "-m", message]), cwd)?;
        Ok(())
    }

    /// Merge `branch` into the branch checked out at `cwd`
    ///
    /// Conflicts make git exit non-zero; they are left in the tree.
    ///
    /// # Errors
    /// Fails when git exits non-zero.
    pub fn merge(&self, branch: &str, message: &str, cwd: &Path) -> Result<CommandOutput, VcsError> {
        self.check(&args(["merge", "-q", "--no-stat", "-m", message, branch]), cwd)
    }

    /// Clone `location` into `destination`
    ///
    /// # Errors
    /// Fails when git exits non-zero.
    pub fn clone_repository(
        &self,
        location: &str,
        destination: &Path,
        cwd: &Path,
    ) -> Result<(), VcsError> {
        let mut argv = args(["clone", "-q", location]);
        argv.push(destination.to_string_lossy().into_owned());
        self.check(&argv, cwd)?;
        Ok(())
    }

    /// Check out a branch, tag or commit
    ///
    /// # Errors
    /// Fails when git exits non-zero.
    pub fn checkout(&self, reference: &str, cwd: &Path) -> Result<(), VcsError> {
        self.check(&args(["checkout", "-q", reference]), cwd)?;
        Ok(())
    }
}

fn args<const N: usize>(parts: [&str; N]) -> Vec<String> {
    parts.iter().map(|s| (*s).to_string()).collect()
}
