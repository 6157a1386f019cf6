//! Upgrade orchestration
//!
//! Re-expands a project's template on a dedicated branch that only ever
//! holds pure template output, then merges that branch into the user's
//! branch so git performs the three-way merge between the last template
//! version, the new template version and the user's edits.

use crate::error::UpgradeError;
use crate::state::{StateTrail, UpgradeState};
use crate::worktree::IsolatedWorkingCopy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use stencil_provenance::{absolutize, merge_into, ProvenanceError, ProvenanceRecord};
use stencil_template::{ConflictPolicy, Engine, MaterializeRequest};
use stencil_vcs::CommandRunner;
use tracing::{info, instrument};

/// Branch holding template snapshots
pub const TEMPLATE_BRANCH: &str = "stencil-template";
/// Remote consulted for an existing template branch
pub const DEFAULT_REMOTE: &str = "origin";
/// Message of template snapshot and merge commits
pub const COMMIT_MESSAGE: &str = "Updated from template";

/// Parameters of one upgrade
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeRequest {
    /// Previously generated directory
    pub directory: PathBuf,
    /// Reference replacing the recorded one
    pub template_override: Option<String>,
    /// Branch, tag or commit to check out after cloning the template
    pub checkout: Option<String>,
    /// Merge the template branch when done
    pub merge: bool,
    /// Pathspecs whose template changes are discarded
    pub ignore: Vec<String>,
}

impl UpgradeRequest {
    /// Upgrade `directory` from its recorded template and merge the result
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            template_override: None,
            checkout: None,
            merge: true,
            ignore: Vec::new(),
        }
    }

    /// With a template reference replacing the recorded one
    #[inline]
    #[must_use]
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template_override = Some(template.into());
        self
    }

    /// With post-clone checkout
    #[inline]
    #[must_use]
    pub fn with_checkout(mut self, checkout: impl Into<String>) -> Self {
        self.checkout = Some(checkout.into());
        self
    }

    /// Whether to merge the template branch
    #[inline]
    #[must_use]
    pub fn with_merge(mut self, merge: bool) -> Self {
        self.merge = merge;
        self
    }

    /// With ignore pathspecs
    #[inline]
    #[must_use]
    pub fn with_ignore<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore = patterns.into_iter().map(Into::into).collect();
        self
    }
}

/// How an upgrade ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpgradeOutcome {
    /// Regenerated tree matched the template branch; nothing committed
    NoChanges,
    /// Template branch advanced and merged into the target
    Merged {
        /// Template branch name
        branch: String,
    },
    /// Template branch advanced; merging is left to the user
    Deferred {
        /// Template branch name
        branch: String,
    },
}

impl UpgradeOutcome {
    /// Final state reached for this outcome
    #[must_use]
    pub fn state(&self) -> UpgradeState {
        match self {
            Self::NoChanges => UpgradeState::NoChanges,
            Self::Merged { .. } => UpgradeState::Merged,
            Self::Deferred { .. } => UpgradeState::Deferred,
        }
    }
}

/// Outcome plus the states traversed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeReport {
    /// How the upgrade ended
    pub outcome: UpgradeOutcome,
    /// States visited, `NoRepo` first and `Cleaned` last
    pub trail: Vec<UpgradeState>,
}

/// Repository layout of the target directory
struct Layout {
    toplevel: PathBuf,
    prefix: String,
    git_dir: PathBuf,
}

/// Drives one upgrade through the state machine
#[derive(Debug)]
pub struct UpgradeOrchestrator<'e, R> {
    engine: &'e Engine<R>,
    branch: String,
    remote: String,
    message: String,
}

impl<'e, R: CommandRunner> UpgradeOrchestrator<'e, R> {
    /// Create orchestrator over `engine`
    #[must_use]
    pub fn new(engine: &'e Engine<R>) -> Self {
        Self {
            engine,
            branch: TEMPLATE_BRANCH.to_string(),
            remote: DEFAULT_REMOTE.to_string(),
            message: COMMIT_MESSAGE.to_string(),
        }
    }

    /// Use a different template branch
    #[inline]
    #[must_use]
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    /// Use a different remote when looking for an existing branch
    #[inline]
    #[must_use]
    pub fn with_remote(mut self, remote: impl Into<String>) -> Self {
        self.remote = remote.into();
        self
    }

    /// Template branch name
    #[inline]
    #[must_use]
    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// Upgrade the project at `request.directory`
    ///
    /// # Errors
    /// See [`upgrade_with_report`](Self::upgrade_with_report).
    pub fn upgrade(&self, request: &UpgradeRequest) -> Result<UpgradeOutcome, UpgradeError> {
        self.upgrade_with_report(request).map(|report| report.outcome)
    }

    /// Upgrade and report the states traversed
    ///
    /// The isolated working copy is removed on every path out of this
    /// function, errors included.
    ///
    /// # Errors
    /// - [`UpgradeError::NotGenerated`] without record or override, before
    ///   any git command runs
    /// - [`UpgradeError::NoVersionControl`] when `HEAD` does not resolve
    /// - [`UpgradeError::UnexpectedProjectDir`] when the template renders a
    ///   differently named directory
    /// - resolution, context, rendering and git failures
    #[instrument(skip_all, fields(directory = %request.directory.display()))]
    pub fn upgrade_with_report(&self, request: &UpgradeRequest) -> Result<UpgradeReport, UpgradeError> {
        let directory = absolutize(&request.directory).map_err(|e| UpgradeError::io_error(&request.directory, e))?;
        self.preflight(&directory, request)?;

        let mut trail = StateTrail::new();
        let outcome = self.run(&directory, request, &mut trail)?;
        trail.advance(UpgradeState::Cleaned)?;

        info!(outcome = ?outcome, "upgrade finished");
        Ok(UpgradeReport {
            outcome,
            trail: trail.visited().to_vec(),
        })
    }

    fn preflight(&self, directory: &Path, request: &UpgradeRequest) -> Result<(), UpgradeError> {
        let store = self.engine.store();
        if request.template_override.is_none() && !store.exists(directory) {
            return Err(UpgradeError::NotGenerated {
                directory: directory.to_path_buf(),
            });
        }
        if !directory.is_dir() {
            return Err(UpgradeError::io_error(
                directory,
                std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
            ));
        }
        if !self.engine.git().has_head(directory)? {
            return Err(UpgradeError::NoVersionControl {
                directory: directory.to_path_buf(),
            });
        }
        Ok(())
    }

    /// Everything between preflight and cleanup; the working copy guard
    /// lives in this scope
    fn run(
        &self,
        directory: &Path,
        request: &UpgradeRequest,
        trail: &mut StateTrail,
    ) -> Result<UpgradeOutcome, UpgradeError> {
        let git = self.engine.git();

        self.ensure_branch(directory)?;
        trail.advance(UpgradeState::BranchReady)?;

        let layout = Layout {
            toplevel: git.toplevel(directory)?,
            prefix: git.show_prefix(directory)?,
            git_dir: git.git_dir(directory)?,
        };
        let name = layout
            .toplevel
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let copy = IsolatedWorkingCopy::attach(
            git,
            directory,
            layout.git_dir.join(&self.branch),
            &name,
            &self.branch,
            layout.prefix.is_empty(),
        )?;
        trail.advance(UpgradeState::WorktreeAttached)?;

        self.regenerate(directory, request, &layout, &copy)?;
        trail.advance(UpgradeState::Regenerated)?;

        git.add_all(copy.path())?;
        if !request.ignore.is_empty() {
            git.reset_paths(&request.ignore, copy.path())?;
            let tracked = git.tracked_paths(&request.ignore, copy.path())?;
            git.checkout_head_paths(&tracked, copy.path())?;
            git.clean_paths(&request.ignore, copy.path())?;
        }
        trail.advance(UpgradeState::Staged)?;

        if !git.has_staged_changes(copy.path())? {
            info!("No changes found");
            trail.advance(UpgradeState::NoChanges)?;
            return Ok(UpgradeOutcome::NoChanges);
        }
        git.commit(&self.message, copy.path())?;
        trail.advance(UpgradeState::Committed)?;

        let outcome = if request.merge {
            git.merge(&self.branch, &self.message, directory)?;
            UpgradeOutcome::Merged {
                branch: self.branch.clone(),
            }
        } else {
            info!(branch = %self.branch, "merge of the template branch left to the user");
            UpgradeOutcome::Deferred {
                branch: self.branch.clone(),
            }
        };
        trail.advance(outcome.state())?;
        Ok(outcome)
    }

    /// Reuse the local branch, else track the remote one, else start it at
    /// the repository's root commit
    fn ensure_branch(&self, directory: &Path) -> Result<(), UpgradeError> {
        let git = self.engine.git();
        if git.verify_ref(&format!("refs/heads/{}", self.branch), directory)? {
            info!(branch = %self.branch, "reusing template branch");
            return Ok(());
        }

        let remote_branch = format!("{}/{}", self.remote, self.branch);
        if git.verify_ref(&format!("refs/remotes/{remote_branch}"), directory)? {
            info!(branch = %self.branch, from = %remote_branch, "creating template branch from remote");
            git.create_branch(&self.branch, &remote_branch, directory)?;
            return Ok(());
        }

        let root = git.root_commit(directory)?;
        info!(branch = %self.branch, root = %root, "creating template branch at root commit");
        git.create_branch(&self.branch, &root, directory)?;
        Ok(())
    }

    fn regenerate(
        &self,
        directory: &Path,
        request: &UpgradeRequest,
        layout: &Layout,
        copy: &IsolatedWorkingCopy<'_, R>,
    ) -> Result<(), UpgradeError> {
        let store = self.engine.store();
        let inherited = store.read_chain(directory)?;
        let record = match store.load(directory) {
            Ok(record) => record,
            Err(ProvenanceError::Missing { .. }) if request.template_override.is_some() => {
                ProvenanceRecord::default()
            }
            Err(e) => return Err(e.into()),
        };

        let mut previous = inherited.clone();
        merge_into(&mut previous, &record.context);
        let reference = request
            .template_override
            .clone()
            .or(record.reference)
            .ok_or_else(|| UpgradeError::NotGenerated {
                directory: directory.to_path_buf(),
            })?;

        let (destination, expected) = if layout.prefix.is_empty() {
            (copy.container().to_path_buf(), copy.path().to_path_buf())
        } else {
            let target = copy.path().join(&layout.prefix);
            if target.exists() {
                fs::remove_dir_all(&target).map_err(|e| UpgradeError::io_error(&target, e))?;
            }
            let parent = target.parent().map_or_else(|| copy.path().to_path_buf(), Path::to_path_buf);
            (parent, target)
        };

        let template = self.engine.resolver().resolve_with_fallback(
            &reference,
            request.checkout.as_deref(),
            self.engine.clone_dir(),
        )?;
        let context = self
            .engine
            .context_builder()
            .build(&template.directory, &inherited, &previous)?;

        let project = self.engine.materializer().create_or_update(&MaterializeRequest {
            template: &template,
            context: &context,
            inherited: &inherited,
            output_dir: &destination,
            policy: ConflictPolicy::Overwrite,
            upgrade: true,
        })?;

        if project != expected {
            return Err(UpgradeError::UnexpectedProjectDir {
                expected,
                actual: project,
            });
        }
        Ok(())
    }
}
